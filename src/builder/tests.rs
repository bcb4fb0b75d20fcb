// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use super::{RecordBuilder, RecordSpec};
use crate::alarm::{Alarm, AlarmStatus, Severity};
use crate::config::{parse_config, ConfigFormat};
use crate::dispatch::Dispatcher;
use crate::engine::SoftEngine;
use crate::errors::{BuildError, EngineError};
use crate::record::{ArrayValue, ElementType, RecordType, ScanPolicy, Value};
use crate::scheduler::SchedulerContext;
use crate::traits::{DeviceSupport, RecordEngine, SchedulerKind};

fn builder_with(engine: Arc<SoftEngine>, context: SchedulerContext) -> RecordBuilder {
    let engine: Arc<dyn RecordEngine> = engine;
    RecordBuilder::new("TS", engine, Dispatcher::new(Arc::new(context)))
}

fn builder() -> (Arc<SoftEngine>, RecordBuilder) {
    let engine = SoftEngine::new();
    let builder = builder_with(Arc::clone(&engine), SchedulerContext::new());
    (engine, builder)
}

#[test]
fn test_names_are_prefixed_and_registered() {
    let (engine, builder) = builder();
    let record = builder.build(RecordSpec::long_in("COUNT")).unwrap();

    assert_eq!(record.name(), "TS:COUNT");
    assert_eq!(engine.names(), vec!["TS:COUNT".to_string()]);
    assert!(builder.lookup("COUNT").is_some());
    assert!(builder.lookup("TS:COUNT").is_some());
    assert!(builder.lookup("OTHER").is_none());

    let dashed = builder_with(engine, SchedulerContext::new()).with_separator("-");
    assert_eq!(dashed.full_name("X"), "TS-X");
}

#[test]
fn test_duplicate_name_rejected() {
    let (_engine, builder) = builder();
    builder.build(RecordSpec::ai_in("A")).unwrap();

    let result = builder.build(RecordSpec::ao_out("A"));
    assert!(matches!(result, Err(BuildError::Duplicate(name)) if name == "TS:A"));
    assert_eq!(builder.records().len(), 1);
}

#[test]
fn test_build_after_init_is_too_late() {
    let (engine, builder) = builder();
    builder.build(RecordSpec::ai_in("EARLY")).unwrap();
    engine.init().unwrap();

    let result = builder.build(RecordSpec::ai_in("LATE"));
    assert!(matches!(result, Err(BuildError::TooLate(name)) if name == "TS:LATE"));
    engine.shutdown();
}

#[test]
fn test_callbacks_refused_on_input_records() {
    let (_engine, builder) = builder();

    let with_update = RecordSpec::ai_in("IN").on_update_fn(|_| async { Ok(()) });
    assert!(matches!(
        builder.build(with_update),
        Err(BuildError::CallbackOnInputRecord(_))
    ));

    let with_validate = RecordSpec::string_in("SIN").validate(|_: &str, _: &Value| true);
    assert!(matches!(
        builder.build(with_validate),
        Err(BuildError::CallbackOnInputRecord(_))
    ));
}

#[test]
fn test_invalid_specs() {
    let (_engine, builder) = builder();

    let cases = [
        RecordSpec::waveform_in("ZERO", 0),
        RecordSpec::new(RecordType::WaveformOut, "UNSIZED"),
        RecordSpec::new(RecordType::Waveform, "EMPTY_INIT")
            .initial_value(ArrayValue::Double(vec![])),
        RecordSpec::long_string_in("LS").length(0),
        RecordSpec::mbb_in("MANY", (0..17).map(|i| format!("s{}", i))),
    ];

    for spec in cases {
        let name = spec.name().to_string();
        let result = builder.build(spec);
        assert!(
            matches!(result, Err(BuildError::InvalidSpec { .. })),
            "{} should be invalid",
            name
        );
    }
    assert!(builder.records().is_empty());
}

#[test]
fn test_waveform_shape_from_initial_value() {
    let (_engine, builder) = builder();

    let inferred = builder
        .build(RecordSpec::new(RecordType::Waveform, "INFERRED").initial_value(vec![1.0, 2.0, 3.0]))
        .unwrap();
    assert_eq!(inferred.shape().element, ElementType::Double);
    assert_eq!(inferred.shape().capacity, 3);

    let typed = builder
        .build(
            RecordSpec::waveform_out("TYPED", 4)
                .element_type(ElementType::UChar)
                .initial_value(vec![1.0, 300.0]),
        )
        .unwrap();
    assert_eq!(typed.shape().capacity, 4);
    assert_eq!(typed.value(), Value::Array(ArrayValue::UChar(vec![1, 44])));

    let empty = builder.build(RecordSpec::waveform_in("EMPTY", 8)).unwrap();
    assert_eq!(empty.value(), Value::Array(ArrayValue::Double(vec![])));
}

#[test]
fn test_long_string_length() {
    let (_engine, builder) = builder();

    let sized = builder
        .build(RecordSpec::long_string_out("FROM_INIT").initial_value("hello"))
        .unwrap();
    assert_eq!(sized.shape().capacity, 6);

    let default = builder.build(RecordSpec::long_string_in("DEFAULT")).unwrap();
    assert_eq!(default.shape().capacity, 256);
    assert_eq!(default.value(), Value::String(String::new()));
}

#[test]
fn test_initial_value_is_coerced_and_clamped() {
    let (_engine, builder) = builder();

    let ao = builder
        .build(RecordSpec::ao_out("AO").drive_limits(0.0, 10.0).initial_value(42.0))
        .unwrap();
    assert_eq!(ao.value(), Value::Double(10.0));

    let bo = builder.build(RecordSpec::bool_out("BO").initial_value(true)).unwrap();
    assert_eq!(bo.value(), Value::Enum(1));

    let bad = builder.build(RecordSpec::mbb_out("MBB", ["a", "b"]).initial_value(99));
    assert!(matches!(bad, Err(BuildError::Device(_))));
}

#[test]
fn test_scan_defaults_by_direction() {
    let (_engine, builder) = builder();

    let input = builder.build(RecordSpec::ai_in("IN")).unwrap();
    let output = builder.build(RecordSpec::ao_out("OUT")).unwrap();
    let periodic = builder
        .build(RecordSpec::ai_in("SLOW").scan("2 second".parse().unwrap()))
        .unwrap();

    assert_eq!(input.scan_policy(), ScanPolicy::IoIntr);
    assert_eq!(output.scan_policy(), ScanPolicy::Passive);
    assert_eq!(
        periodic.scan_policy(),
        ScanPolicy::Periodic(std::time::Duration::from_secs(2))
    );
}

#[test]
fn test_action_always_updates() {
    let (_engine, builder) = builder();
    let action = builder
        .build(RecordSpec::action("GO").on_update_fn(|_| async { Ok(()) }))
        .unwrap();
    assert_eq!(action.record_type(), RecordType::Bo);
    assert_eq!(action.scheduler(), Some(SchedulerKind::Coroutine));
}

#[test]
fn test_scheduler_binding_explicit_and_default() {
    let engine = SoftEngine::new();
    let builder = builder_with(engine, SchedulerContext::new())
        .with_default_scheduler(SchedulerKind::EventLoop);

    let tagged = builder
        .build(
            RecordSpec::ao_out("TAGGED")
                .scheduler(SchedulerKind::Coroutine)
                .on_update_fn(|_| async { Ok(()) }),
        )
        .unwrap();
    let defaulted = builder
        .build(RecordSpec::ao_out("DEFAULTED").on_update_fn(|_| async { Ok(()) }))
        .unwrap();
    let silent = builder.build(RecordSpec::ao_out("SILENT")).unwrap();

    assert_eq!(tagged.scheduler(), Some(SchedulerKind::Coroutine));
    assert_eq!(defaulted.scheduler(), Some(SchedulerKind::EventLoop));
    assert_eq!(silent.scheduler(), None);
}

/// Building from a scheduler thread binds the callback to that scheduler.
#[tokio::test]
async fn test_scheduler_inferred_from_building_thread() {
    let context = SchedulerContext::new();
    context.start(SchedulerKind::EventLoop).unwrap();
    let builder = Arc::new(builder_with(SoftEngine::new(), context));

    let inner = Arc::clone(&builder);
    let scheduler = builder
        .dispatcher()
        .call(SchedulerKind::EventLoop, move || async move {
            let record = inner.build(
                RecordSpec::ao_out("INFERRED").on_update_fn(|_| async { Ok(()) }),
            )?;
            Ok(record.scheduler())
        })
        .await
        .unwrap();

    assert_eq!(scheduler, Some(SchedulerKind::EventLoop));
    builder.dispatcher().context().shutdown_all();
}

#[test]
fn test_build_from_config() {
    let cfg = parse_config(
        r#"
device_name: TS
records:
  - name: MODE
    type: mbbo
    options: [Off, Standby, On]
    initial_value: 2
    severity: MINOR
    status: STATE
    log_updates: true
    scheduler: event_loop
    egu: mode
  - name: RATE
    type: ai
    scan: 0.5 second
    prec: 3
  - name: BAD
    type: ai
    scan: sometimes
"#,
        ConfigFormat::Yaml,
    )
    .unwrap();

    let engine = SoftEngine::new();
    let builder = builder_with(Arc::clone(&engine), SchedulerContext::new());

    let mode = builder.build_from_config(&cfg.records[0]).unwrap();
    assert_eq!(mode.value(), Value::Enum(2));
    assert_eq!(mode.scheduler(), Some(SchedulerKind::EventLoop));
    assert_eq!(mode.metadata().options, vec!["Off", "Standby", "On"]);
    assert_eq!(mode.metadata().egu.as_deref(), Some("mode"));

    let rate = builder.build_from_config(&cfg.records[1]).unwrap();
    assert_eq!(
        rate.scan_policy(),
        ScanPolicy::Periodic(std::time::Duration::from_millis(500))
    );
    assert_eq!(rate.metadata().prec, Some(3));

    assert!(matches!(
        builder.build_from_config(&cfg.records[2]),
        Err(BuildError::InvalidSpec { .. })
    ));

    engine.init().unwrap();
    assert_eq!(
        mode.snapshot().alarm,
        Alarm::new(Severity::Minor, AlarmStatus::State)
    );
    assert!(matches!(
        builder.build(RecordSpec::ai_in("AFTER")),
        Err(BuildError::TooLate(_))
    ));
    assert!(matches!(
        engine.register("TS:AFTER", mode.clone()),
        Err(EngineError::AlreadyInitialised)
    ));
    engine.shutdown();
}
