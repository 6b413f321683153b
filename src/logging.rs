//! ログ初期化
//!
//! 画面（stdout）は操作者向けの表示に使うため、ログは stderr に出す。
//! `RUST_LOG` があればそれを優先する。

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "chem_scan=info,chem_scan_common=info";
const VERBOSE_FILTER: &str = "chem_scan=debug,chem_scan_common=debug";

/// グローバルなtracing subscriberを設定（2回目以降は無視）
pub fn init(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
