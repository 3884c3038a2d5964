//! nginx バーチャルホスト生成
//!
//! サービス定義から `__HTTP_BLOCK__` / `__HTTPS_BLOCK__` に入る server ブロックを生成します。
//!
//! - 静的配信の有無 → [`RouteStrategy`](crate::model::RouteStrategy)
//! - HTTP のみか HTTPS リダイレクトか → [`ListenerPlan`](crate::model::ListenerPlan)

mod blocks;
mod locations;
mod options;
mod server;

pub use blocks::*;
pub use locations::*;
pub use options::*;
pub use server::*;

use crate::model::ServiceDescriptor;

/// サービス定義から server ブロックを生成
pub fn render_vhost(service: &ServiceDescriptor, options: &VhostOptions) -> ServerBlocks {
    let blocks = RouteBlocks::build(
        &service.route_strategy(),
        &service.upstream_host,
        &service.upstream_port,
    );
    let custom_locations = render_custom_locations(&service.locations);
    compose_server_blocks(service, &blocks, &custom_locations, options)
}
