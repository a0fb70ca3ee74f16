use crate::{
    device::accessor::Connector,
    output::json::RecordSink,
    spider::{
        config::{ConfigError, SpiderConfig},
        controller::{RunReport, Spider},
        hooks::RoundObserver,
    },
};

pub mod cli;
pub mod dedup;
pub mod device;
pub mod extract;
pub mod output;
pub mod report;
pub mod spider;
pub mod trace;

/// One-shot run: validate `config`, scrape through `connector`, persist to `sink`.
///
/// Configuration errors are returned before any device is touched; every
/// other problem is reported in the returned `RunReport`.
pub fn scrape<C, O, S>(
    config: SpiderConfig,
    connector: &mut C,
    observer: &mut O,
    sink: &mut S,
) -> Result<RunReport, ConfigError>
where
    C: Connector,
    O: RoundObserver + ?Sized,
    S: RecordSink + ?Sized,
{
    let mut spider = Spider::new(config)?;
    Ok(spider.run(connector, observer, sink))
}
