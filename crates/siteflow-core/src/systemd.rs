//! systemd ユニット生成

use crate::model::ServiceDescriptor;
use crate::template::Replacements;

/// ユニットテンプレートに渡す値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSettings<'a> {
    pub name: &'a str,
    pub working_dir: &'a str,
    pub user: &'a str,
    pub start_cmd: &'a str,
    pub stop_cmd: &'a str,
    pub service_type: &'static str,
    pub remain_after_exit: &'static str,
    pub restart: &'static str,
}

impl<'a> UnitSettings<'a> {
    pub fn from_descriptor(service: &'a ServiceDescriptor) -> Self {
        let kind = service.unit_kind();
        Self {
            name: &service.name,
            working_dir: &service.working_dir,
            user: &service.user,
            start_cmd: &service.start_cmd,
            stop_cmd: &service.stop_cmd,
            service_type: kind.service_type(),
            remain_after_exit: kind.remain_after_exit(),
            restart: kind.restart(),
        }
    }

    /// `systemd.service.tmpl` のプレースホルダー置換表
    pub fn replacements(&self) -> Replacements {
        [
            ("NAME", self.name),
            ("WORKING_DIR", self.working_dir),
            ("USER", self.user),
            ("START_CMD", self.start_cmd),
            ("STOP_CMD", self.stop_cmd),
            ("TYPE", self.service_type),
            ("REMAIN_AFTER_EXIT", self.remain_after_exit),
            ("RESTART", self.restart),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
    }
}
