#[cfg(test)]
mod integration_tests {
    use crate::alarm::{AlarmStatus, Severity};
    use crate::config::{load_and_validate_config, load_config, ConfigFormat};
    use crate::record::{ElementType, PlainValue, RecordType};
    use crate::traits::SchedulerKind;

    /// The YAML demo loads and validates
    #[test]
    fn test_demo_yaml_loading() {
        let config = load_and_validate_config("configs/demo-ioc.yaml").unwrap();

        assert_eq!(config.device_name, "DEMO");
        assert_eq!(config.dispatcher.default_scheduler, SchedulerKind::Coroutine);
        assert_eq!(config.dispatcher.coroutine_workers, 2);
        assert_eq!(
            config.alarm_priority,
            vec![AlarmStatus::Udf, AlarmStatus::Link, AlarmStatus::Scan, AlarmStatus::Soft]
        );
        assert!(!config.autosave.enabled);
        assert_eq!(config.records.len(), 8);

        let setpoint = &config.records[0];
        assert_eq!(setpoint.name, "SETPOINT");
        assert_eq!(setpoint.record_type, RecordType::Ao);
        assert_eq!((setpoint.drvl, setpoint.drvh), (Some(0.0), Some(100.0)));
        assert!(setpoint.autosave && setpoint.log_updates);

        let mode = &config.records[2];
        assert_eq!(mode.options, vec!["Off", "Standby", "On"]);
        assert_eq!(mode.scheduler, Some(SchedulerKind::EventLoop));

        let status = &config.records[5];
        assert_eq!(status.severity, Some(Severity::Minor));
        assert_eq!(status.status, Some(AlarmStatus::State));

        assert_eq!(config.records[6].element_type, Some(ElementType::Float));
        assert_eq!(config.records[7].initial_value, Some(PlainValue::Text(String::new())));
    }

    /// The TOML demo loads and validates
    #[test]
    fn test_demo_toml_loading() {
        let config = load_and_validate_config("configs/demo-ioc.toml").unwrap();

        assert_eq!(config.device_name, "DEMO");
        assert_eq!(config.separator, ":");
        assert_eq!(config.dispatcher.default_scheduler, SchedulerKind::EventLoop);
        assert!(config.dispatcher.lazy_start);
        assert_eq!(config.records.len(), 3);
        assert_eq!(config.records[1].scan.as_deref(), Some("I/O Intr"));
        assert_eq!(
            config.records[2].initial_value,
            Some(PlainValue::Ints(vec![1, 2, 3, 4]))
        );
    }

    /// Both formats describe the same setpoint record
    #[test]
    fn test_formats_agree() {
        let yaml = load_config("configs/demo-ioc.yaml").unwrap();
        let toml = load_config("configs/demo-ioc.toml").unwrap();

        assert_eq!(yaml.records[0].name, toml.records[0].name);
        assert_eq!(yaml.records[0].record_type, toml.records[0].record_type);
        assert_eq!(yaml.records[0].initial_value, toml.records[0].initial_value);
        assert_eq!(
            ConfigFormat::from_path(std::path::Path::new("configs/demo-ioc.toml")).unwrap(),
            ConfigFormat::Toml
        );
    }
}
