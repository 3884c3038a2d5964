use crate::utils;
use colored::Colorize;
use serde::Serialize;
use siteflow_config::ResolvedConfig;
use siteflow_core::{
    ListenerPlan, LoadedDescriptors, RouteStrategy, ServiceDescriptor, SkippedDescriptor, UnitKind,
    load_descriptors,
};
use std::path::Path;

/// `validate --json` の出力
#[derive(Serialize)]
struct ValidationReport<'a> {
    services: Vec<ServiceSummary<'a>>,
    skipped: Vec<SkippedSummary<'a>>,
}

#[derive(Serialize)]
struct ServiceSummary<'a> {
    #[serde(flatten)]
    descriptor: &'a ServiceDescriptor,
    upstream: String,
    route: RouteStrategy,
    listener: ListenerPlan,
    unit: UnitKind,
}

#[derive(Serialize)]
struct SkippedSummary<'a> {
    path: &'a Path,
    reason: &'a str,
}

impl<'a> From<&'a LoadedDescriptors> for ValidationReport<'a> {
    fn from(loaded: &'a LoadedDescriptors) -> Self {
        Self {
            services: loaded
                .services
                .iter()
                .map(|descriptor| ServiceSummary {
                    descriptor,
                    upstream: descriptor.upstream_url(),
                    route: descriptor.route_strategy(),
                    listener: descriptor.listener_plan(),
                    unit: descriptor.unit_kind(),
                })
                .collect(),
            skipped: loaded
                .skipped
                .iter()
                .map(|SkippedDescriptor { path, reason }| SkippedSummary { path, reason })
                .collect(),
        }
    }
}

pub fn handle(config: &ResolvedConfig, services: &[String], json: bool) -> anyhow::Result<()> {
    if !json {
        println!("{}", "サービス定義を検証中...".blue());
        utils::print_loaded_config(config);
    }

    let loaded = load_descriptors(&config.paths.services_dir, services)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&ValidationReport::from(&loaded))?
        );
    } else {
        print_text(&loaded);
    }

    if !loaded.skipped.is_empty() {
        anyhow::bail!("{}件のサービス定義が不正です", loaded.skipped.len());
    }
    Ok(())
}

fn print_text(loaded: &LoadedDescriptors) {
    println!();
    if loaded.skipped.is_empty() {
        println!("{}", "✓ サービス定義は正常です！".green().bold());
    } else {
        println!("{}", "✗ 不正なサービス定義があります".red().bold());
    }

    println!();
    println!("サマリー:");
    println!("  サービス: {}個", loaded.services.len());
    for service in &loaded.services {
        print_summary(service);
    }

    utils::print_skipped(&loaded.skipped);
}

fn print_summary(service: &ServiceDescriptor) {
    println!("    - {} ({})", service.name.cyan(), service.domain);
    println!("        upstream: {}", service.upstream_url());

    let strategy = service.route_strategy();
    let route = match &strategy {
        RouteStrategy::StaticWithFallback { root } => {
            format!("{} ({})", strategy.label(), root)
        }
        RouteStrategy::DirectProxy => strategy.label().to_string(),
    };
    println!(
        "        route: {}, listener: {}, unit: {}",
        route,
        service.listener_plan().label(),
        service.unit_kind().service_type()
    );

    if !service.locations.is_empty() {
        println!("        locations: {}個", service.locations.len());
    }
    if let Some(migrate_cmd) = &service.migrate_cmd {
        println!("        migrate: {}", migrate_cmd);
    }
}
