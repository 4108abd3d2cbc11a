//! Logging installed from a configuration file, with a bus emitting
//! delivery logs underneath it.

use std::io::Write;

use herald_bus::{Bus, BusConfig};
use herald_telemetry::{LogConfig, LogFormat, TelemetryError, setup_logging};
use herald_test::{Journal, RecordingSubscriber, ping_event};

#[test]
fn logging_from_file_then_a_chatty_bus() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(
        file,
        r#"{{"level": "warn", "format": "compact", "directives": ["herald_bus=trace"]}}"#
    )?;
    let config: LogConfig = serde_json::from_str(&std::fs::read_to_string(file.path())?)?;
    assert_eq!(config.format, LogFormat::Compact);

    setup_logging(&config)?;
    assert!(matches!(
        setup_logging(&config),
        Err(TelemetryError::InitError(_))
    ));

    let bus_config = BusConfig::from_toml_str("name = \"chatty\"\nlog_deliveries = true\n")?;
    let bus = Bus::with_config(bus_config, None);
    let journal = Journal::new();
    let recorder = RecordingSubscriber::new("rec", &journal);
    bus.register(&recorder)?;
    // Handler faults are not `Send`, so they cannot travel inside `anyhow`.
    bus.publish(ping_event())
        .map_err(|e| anyhow::anyhow!("publish failed: {e}"))?;

    assert_eq!(bus.name(), "chatty");
    assert_eq!(journal.entries(), vec!["rec:ping"]);
    Ok(())
}
