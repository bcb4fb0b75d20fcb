use std::fs;
use std::io::Cursor;
use std::path::Path;

use crate::builder::RecordSpec;
use crate::config::{parse_config, ConfigFormat, IocConfig};
use crate::errors::{ConfigError, IocError};
use crate::ioc::{Autosave, Ioc, Reply};
use crate::record::{ArrayValue, PlainValue, Value};
use crate::traits::RecordEngine;

const CONFIG: &str = r#"
device_name: TS
autosave:
  enabled: true
  save_period_seconds: 3600
records:
  - name: GAIN
    type: ao
    initial_value: 1.5
    autosave: true
  - name: MODE
    type: mbbo
    options: [Off, Standby, On]
    autosave: true
  - name: TRACE
    type: waveform_out
    length: 4
    element_type: short
    autosave: true
  - name: VOLATILE
    type: ao
    initial_value: 2.0
  - name: READBACK
    type: ai
"#;

fn config_in(dir: &Path) -> IocConfig {
    let mut config = parse_config(CONFIG, ConfigFormat::Yaml).unwrap();
    config.autosave.directory = Some(dir.to_path_buf());
    config
}

#[test]
fn test_autosave_round_trip_across_restarts() {
    let dir = tempfile::tempdir().unwrap();

    {
        let ioc = Ioc::new(config_in(dir.path())).unwrap();
        ioc.init().unwrap();
        let builder = ioc.builder();
        builder.lookup("GAIN").unwrap().write(7.25, false).unwrap();
        builder.lookup("MODE").unwrap().write(2, false).unwrap();
        builder
            .lookup("TRACE")
            .unwrap()
            .write(vec![1.0, 2.0, 3.0], false)
            .unwrap();
        builder.lookup("VOLATILE").unwrap().write(9.0, false).unwrap();
        ioc.shutdown();
    }

    let saved = fs::read_to_string(dir.path().join("TS.softsav")).unwrap();
    let state: std::collections::BTreeMap<String, PlainValue> = serde_yaml::from_str(&saved).unwrap();
    assert_eq!(state.len(), 3);
    assert_eq!(state["TS:GAIN"], PlainValue::Float(7.25));
    assert_eq!(state["TS:MODE"], PlainValue::Int(2));
    assert_eq!(state["TS:TRACE"], PlainValue::Ints(vec![1, 2, 3]));
    assert!(dir.path().join("TS.softsavB").is_file());

    let ioc = Ioc::new(config_in(dir.path())).unwrap();
    ioc.init().unwrap();
    let engine = ioc.engine();
    assert_eq!(engine.read("TS:GAIN").unwrap().value, Value::Double(7.25));
    assert_eq!(engine.read("TS:MODE").unwrap().value, Value::Enum(2));
    assert_eq!(
        engine.read("TS:TRACE").unwrap().value,
        Value::Array(ArrayValue::Short(vec![1, 2, 3]))
    );
    assert_eq!(engine.read("TS:VOLATILE").unwrap().value, Value::Double(2.0));

    let backups = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("TS.softsav_"))
        .count();
    assert_eq!(backups, 1);
    ioc.shutdown();
}

#[test]
fn test_autosave_writes_only_on_change() {
    let dir = tempfile::tempdir().unwrap();
    let ioc = Ioc::new(config_in(dir.path())).unwrap();
    let config = ioc.config().autosave.clone();
    let autosave = Autosave::new(&config, "TS", ioc.builder().records()).unwrap();

    assert_eq!(autosave.len(), 3);
    assert!(autosave.save().unwrap());
    assert!(!autosave.save().unwrap());

    ioc.builder().lookup("GAIN").unwrap().write(3.0, false).unwrap();
    assert!(autosave.save().unwrap());
    ioc.shutdown();
}

#[test]
fn test_autosave_load_skips_bad_entries() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("TS.softsav"),
        "TS:GAIN: 4.5\nTS:MODE: 42\nTS:GONE: 1\n",
    )
    .unwrap();

    let ioc = Ioc::new(config_in(dir.path())).unwrap();
    let autosave = Autosave::new(&ioc.config().autosave, "TS", ioc.builder().records()).unwrap();

    assert_eq!(autosave.load().unwrap(), 1);
    assert_eq!(ioc.builder().lookup("GAIN").unwrap().value(), Value::Double(4.5));
    assert_eq!(ioc.builder().lookup("MODE").unwrap().value(), Value::Enum(0));
    ioc.shutdown();
}

#[test]
fn test_restart_backup_is_timestamped() {
    let dir = tempfile::tempdir().unwrap();
    let ioc = Ioc::new(config_in(dir.path())).unwrap();
    let autosave = Autosave::new(&ioc.config().autosave, "TS", ioc.builder().records()).unwrap();

    assert_eq!(autosave.backup_existing().unwrap(), None);

    autosave.save().unwrap();
    let backup = autosave.backup_existing().unwrap().unwrap();
    let name = backup.file_name().unwrap().to_string_lossy().into_owned();
    let suffix = name.strip_prefix("TS.softsav_").unwrap();

    assert_eq!(suffix.len(), 13);
    assert!(chrono::NaiveDateTime::parse_from_str(suffix, "%y%m%d-%H%M%S").is_ok());
    assert_eq!(
        fs::read_to_string(&backup).unwrap(),
        fs::read_to_string(autosave.save_path()).unwrap()
    );
    ioc.shutdown();
}

#[test]
fn test_autosave_requires_directory() {
    let mut config = parse_config(CONFIG, ConfigFormat::Yaml).unwrap();
    config.autosave.directory = Some(Path::new("/definitely/not/here").to_path_buf());
    let ioc = Ioc::new(config).unwrap();

    assert!(matches!(ioc.init(), Err(IocError::Autosave(_))));
    ioc.shutdown();
}

#[test]
fn test_invalid_config_rejected() {
    let config = parse_config(CONFIG, ConfigFormat::Yaml).unwrap();
    assert!(matches!(
        Ioc::new(config),
        Err(IocError::Config(ConfigError::Invalid(_)))
    ));
}

#[test]
fn test_init_twice_and_late_records() {
    let dir = tempfile::tempdir().unwrap();
    let ioc = Ioc::new(config_in(dir.path())).unwrap();
    ioc.builder()
        .build(RecordSpec::long_in("EXTRA"))
        .unwrap();

    ioc.init().unwrap();
    assert!(ioc.is_initialised());
    assert!(matches!(ioc.init(), Err(IocError::AlreadyInitialised)));
    assert!(ioc.builder().build(RecordSpec::long_in("LATE")).is_err());
    assert_eq!(ioc.engine().names().len(), 6);
    ioc.shutdown();
    ioc.shutdown();
}

#[test]
fn test_shell_commands() {
    let dir = tempfile::tempdir().unwrap();
    let ioc = Ioc::new(config_in(dir.path())).unwrap();
    ioc.init().unwrap();
    let shell = ioc.shell();

    let output = |line: &str| match shell.execute(line) {
        Reply::Output(text) => text,
        Reply::Exit => panic!("unexpected exit for {}", line),
    };

    assert_eq!(output("dbl TS:G*"), "TS:GAIN");
    assert_eq!(output("dbl").lines().count(), 5);
    assert_eq!(output("dbl TS:[GM]*"), "TS:GAIN\nTS:MODE");
    assert!(output("dbl TS:[").starts_with("dbl: invalid pattern 'TS:['"));
    assert_eq!(output("dbgf GAIN"), "TS:GAIN 1.5 NO_ALARM/NO_ALARM");
    assert_eq!(output("dbpf TS:GAIN 2.5"), "TS:GAIN 2.5 NO_ALARM/NO_ALARM");
    assert_eq!(output("dbpf MODE Standby"), "TS:MODE 1 NO_ALARM/NO_ALARM");
    assert!(output("dbpf MODE Sideways").starts_with("dbpf: cannot interpret"));
    assert!(output("dbpf READBACK 3").starts_with("TS:READBACK 3"));
    assert_eq!(output("dbgf NOPE"), "dbgf: no record named 'NOPE'");
    assert!(output("frobnicate").starts_with("unknown command"));
    assert!(output("help").contains("dbpr <name>"));

    let json: serde_json::Value = serde_json::from_str(&output("dbpr MODE")).unwrap();
    assert_eq!(json["name"], "TS:MODE");
    assert_eq!(json["record_type"], "mbbo");
    assert_eq!(json["value"], 1);
    assert_eq!(json["severity"], "NO_ALARM");
    assert_eq!(json["options"], serde_json::json!(["Off", "Standby", "On"]));

    assert_eq!(shell.execute("exit"), Reply::Exit);
    ioc.shutdown();
}

#[test]
fn test_shell_run_stops_at_exit() {
    let dir = tempfile::tempdir().unwrap();
    let ioc = Ioc::new(config_in(dir.path())).unwrap();
    ioc.init().unwrap();

    let input = Cursor::new("dbgf GAIN\n\nexit\ndbgf MODE\n");
    let mut output = Vec::new();
    ioc.shell().run(input, &mut output).unwrap();

    assert_eq!(String::from_utf8(output).unwrap(), "TS:GAIN 1.5 NO_ALARM/NO_ALARM\n");
    ioc.shutdown();
}
