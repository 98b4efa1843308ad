//! Menu-driven controller: owns the registry and dispatches numbered commands.

#![allow(missing_docs)]

use std::io::{BufRead, Write};

use crate::console::device_ops::{self, Attribute, MeasurementOutcome, RangePolicy};
use crate::console::prompt::Prompter;
use crate::core::config::SessionConfig;
use crate::core::errors::{RegistryError, Result};
use crate::device::registry::Registry;
use crate::device::DeviceType;
use crate::logger::jsonl::{ActivityLog, EventType, LogEntry, Severity};

const MAIN_MENU: &str = "\nMain Menu:\n1. Add new device\n2. Select device\n3. Start measuring\n\
4. Stop measuring\n5. Print device info\n6. Set measurement\n7. Change device attributes\n\
0. Exit\nEnter option: ";

const ATTRIBUTE_MENU: &str = "Change attribute:\n1. Name\n2. Unit\n3. Min Value\n4. Max Value\n\
5. Material\n6. Temperature Scale (if applicable)\n7. Calibration Offset (if applicable)\n\
Enter option: ";

const NO_SELECTION: &str = "No device selected.";

/// Main menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    AddDevice,
    SelectDevice,
    StartMeasuring,
    StopMeasuring,
    PrintDevice,
    SetMeasurement,
    ChangeAttribute,
    Exit,
}

impl MenuCommand {
    /// Parse a menu token; anything unrecognized is `None`.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token.parse::<i64>().ok()? {
            1 => Some(Self::AddDevice),
            2 => Some(Self::SelectDevice),
            3 => Some(Self::StartMeasuring),
            4 => Some(Self::StopMeasuring),
            5 => Some(Self::PrintDevice),
            6 => Some(Self::SetMeasurement),
            7 => Some(Self::ChangeAttribute),
            0 => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Why the session loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The exit command was chosen.
    Exit,
    /// Input reached end-of-file.
    InputClosed,
}

enum Flow {
    Continue,
    Exit,
}

/// One interactive session over a prompter.
pub struct Session<R, W> {
    prompter: Prompter<R, W>,
    registry: Registry,
    log: ActivityLog,
    policy: RangePolicy,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(prompter: Prompter<R, W>, rules: &SessionConfig, log: ActivityLog) -> Self {
        let policy = if rules.strict_range {
            RangePolicy::Strict
        } else {
            RangePolicy::Permissive
        };
        Self {
            prompter,
            registry: Registry::with_limit(rules.max_devices),
            log,
            policy,
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Release the prompter's reader and writer.
    pub fn into_parts(self) -> (R, W) {
        self.prompter.into_parts()
    }

    /// Run the menu loop until exit or end of input.
    ///
    /// Rejected user actions are reported in place; only terminal failures
    /// are returned as errors.
    pub fn run(&mut self) -> Result<SessionEnd> {
        self.log
            .record(&LogEntry::new(EventType::SessionStart, Severity::Info));

        let end = loop {
            match self.step() {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break SessionEnd::Exit,
                Err(RegistryError::InputClosed) => break SessionEnd::InputClosed,
                Err(err) => {
                    self.log
                        .record(&LogEntry::fatal(EventType::SessionStop, &err));
                    return Err(err);
                }
            }
        };

        let reason = match end {
            SessionEnd::Exit => "exit",
            SessionEnd::InputClosed => "input closed",
        };
        self.log.record(
            &LogEntry::new(EventType::SessionStop, Severity::Info)
                .with_details(format!("{reason}; {} device(s)", self.registry.len())),
        );
        Ok(end)
    }

    fn step(&mut self) -> Result<Flow> {
        let token = self.prompter.ask_token(MAIN_MENU)?;
        let Some(command) = MenuCommand::parse(&token) else {
            self.prompter.warn("Invalid option. Please try again.")?;
            let err = RegistryError::InvalidChoice {
                what: "menu option",
                raw: token.parse().unwrap_or(-1),
            };
            self.log
                .record(&LogEntry::rejected(EventType::CommandRejected, &err));
            return Ok(Flow::Continue);
        };

        let result = match command {
            MenuCommand::Exit => return Ok(Flow::Exit),
            MenuCommand::AddDevice => self.add_device(),
            MenuCommand::SelectDevice => self.select_device(),
            MenuCommand::StartMeasuring => self.start_measuring(),
            MenuCommand::StopMeasuring => self.stop_measuring(),
            MenuCommand::PrintDevice => self.print_device(),
            MenuCommand::SetMeasurement => self.set_measurement(),
            MenuCommand::ChangeAttribute => self.change_attribute(),
        };

        match result {
            Ok(()) => Ok(Flow::Continue),
            Err(err) if err.is_recoverable() => {
                self.report_rejection(&err)?;
                Ok(Flow::Continue)
            }
            Err(err) => Err(err),
        }
    }

    fn report_rejection(&mut self, err: &RegistryError) -> Result<()> {
        let message = match err {
            RegistryError::NoSelection => NO_SELECTION.to_string(),
            RegistryError::Unsupported { capability } => {
                format!("Selected device is not {}.", capability.required_variant())
            }
            RegistryError::InvalidChoice { what: "device type", .. } => {
                "Invalid device type. No device added.".to_string()
            }
            RegistryError::InvalidChoice { .. } => "Invalid option.".to_string(),
            RegistryError::DeviceLimit { limit } => {
                format!("Device limit reached ({limit}). No device added.")
            }
            other => other.to_string(),
        };
        self.prompter.warn(&message)?;
        self.log
            .record(&LogEntry::rejected(EventType::CommandRejected, err));
        Ok(())
    }

    fn add_device(&mut self) -> Result<()> {
        let token = self
            .prompter
            .ask_token("Enter device type (1 for Temperature, 2 for Advanced Temperature): ")?;
        let device_type = token
            .parse::<i64>()
            .ok()
            .and_then(DeviceType::from_choice)
            .ok_or_else(|| RegistryError::InvalidChoice {
                what: "device type",
                raw: token.parse().unwrap_or(-1),
            })?;

        self.registry.ensure_capacity()?;
        let device = device_ops::initialize(&mut self.prompter, device_type, self.policy)?;
        let index = self.registry.add(device)?;
        self.record_device(LogEntry::new(EventType::DeviceAdded, Severity::Info), index);
        Ok(())
    }

    fn select_device(&mut self) -> Result<()> {
        if self.registry.is_empty() {
            self.prompter
                .warn("No devices available. Please add a new device first.")?;
            return Ok(());
        }

        let prompt = format!("Select device index (1 to {}): ", self.registry.len());
        let token = self.prompter.ask_token(&prompt)?;
        let position = token.parse::<i64>().unwrap_or(0);
        match self.registry.select(position) {
            Some(index) => self.record_device(
                LogEntry::new(EventType::DeviceSelected, Severity::Info),
                index,
            ),
            None => {
                self.prompter.warn("Invalid device index.")?;
                let err = RegistryError::InvalidChoice {
                    what: "device index",
                    raw: position,
                };
                self.log
                    .record(&LogEntry::rejected(EventType::CommandRejected, &err));
            }
        }
        Ok(())
    }

    fn start_measuring(&mut self) -> Result<()> {
        let (index, device) = self.registry.current_mut()?;
        if device_ops::start_measuring(&mut self.prompter, device)? {
            self.record_device(LogEntry::new(EventType::MeasuringStarted, Severity::Info), index);
        }
        Ok(())
    }

    fn stop_measuring(&mut self) -> Result<()> {
        let (index, device) = self.registry.current_mut()?;
        if device_ops::stop_measuring(&mut self.prompter, device)? {
            self.record_device(LogEntry::new(EventType::MeasuringStopped, Severity::Info), index);
        }
        Ok(())
    }

    fn print_device(&mut self) -> Result<()> {
        let (_, device) = self.registry.current_mut()?;
        device_ops::print(&mut self.prompter, device)
    }

    fn set_measurement(&mut self) -> Result<()> {
        let (index, device) = self.registry.current_mut()?;
        match device_ops::set_measurement(&mut self.prompter, device)? {
            MeasurementOutcome::Stored(value) => {
                self.record_device(
                    LogEntry::new(EventType::MeasurementSet, Severity::Info).with_value(value),
                    index,
                );
            }
            MeasurementOutcome::Rejected(err) => {
                self.record_device(LogEntry::rejected(EventType::MeasurementRejected, &err), index);
            }
        }
        Ok(())
    }

    fn change_attribute(&mut self) -> Result<()> {
        let (index, device) = self.registry.current_mut()?;
        let token = self.prompter.ask_token(ATTRIBUTE_MENU)?;
        let attribute = token
            .parse::<i64>()
            .ok()
            .and_then(Attribute::from_choice)
            .ok_or_else(|| RegistryError::InvalidChoice {
                what: "attribute",
                raw: token.parse().unwrap_or(-1),
            })?;

        device_ops::edit_attribute(&mut self.prompter, device, attribute, self.policy)?;
        self.record_device(
            LogEntry::new(EventType::AttributeChanged, Severity::Info)
                .with_details(attribute.to_string()),
            index,
        );
        Ok(())
    }

    /// Tag `entry` with the device at `index` and record it.
    fn record_device(&mut self, entry: LogEntry, index: usize) {
        let entry = match self.registry.get(index) {
            Some(device) => {
                entry.with_device(index, device.device_type().label(), &device.base.name)
            }
            None => entry,
        };
        self.log.record(&entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    type TestSession = Session<Cursor<Vec<u8>>, Vec<u8>>;

    fn session_with(input: &str, rules: &SessionConfig) -> TestSession {
        let prompter = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        Session::new(prompter, rules, ActivityLog::disabled())
    }

    fn run(input: &str) -> (SessionEnd, TestSession) {
        let mut session = session_with(input, &SessionConfig::default());
        let end = session.run().unwrap();
        (end, session)
    }

    fn output(session: TestSession) -> String {
        String::from_utf8(session.into_parts().1).unwrap()
    }

    const ADD_T1: &str = "1\n1\nT1\nC\n0\n100\n2\n1\n";
    const ADD_ADV: &str = "1\n2\nA1\nC\n0\n100\n1\n1\n0.5\n";

    #[test]
    fn menu_parse_accepts_codes_only() {
        assert_eq!(MenuCommand::parse("1"), Some(MenuCommand::AddDevice));
        assert_eq!(MenuCommand::parse("0"), Some(MenuCommand::Exit));
        assert_eq!(MenuCommand::parse("8"), None);
        assert_eq!(MenuCommand::parse("one"), None);
    }

    #[test]
    fn exit_command_ends_session() {
        let (end, session) = run("0\n");
        assert_eq!(end, SessionEnd::Exit);
        assert!(output(session).contains("Main Menu:"));
    }

    #[test]
    fn end_of_input_ends_session() {
        let (end, _) = run("5\n");
        assert_eq!(end, SessionEnd::InputClosed);
    }

    #[test]
    fn unknown_option_is_reported() {
        let (_, session) = run("9\nabc\n0\n");
        let text = output(session);
        assert_eq!(text.matches("Invalid option. Please try again.").count(), 2);
    }

    #[test]
    fn single_device_commands_need_selection() {
        let (_, session) = run("3\n4\n5\n6\n7\n0\n");
        assert_eq!(output(session).matches("No device selected.").count(), 5);
    }

    #[test]
    fn add_appends_and_selects() {
        let input = format!("{ADD_T1}{ADD_ADV}0\n");
        let (_, session) = run(&input);
        assert_eq!(session.registry().len(), 2);
        assert_eq!(session.registry().current_index(), Some(1));
        let names: Vec<&str> = session
            .registry()
            .iter()
            .map(|device| device.base.name.as_str())
            .collect();
        assert_eq!(names, vec!["T1", "A1"]);
    }

    #[test]
    fn unknown_device_type_leaves_registry_unchanged() {
        let (_, session) = run("1\n3\n1\nx\n0\n");
        assert!(session.registry().is_empty());
        let text = output(session);
        assert_eq!(text.matches("Invalid device type. No device added.").count(), 2);
    }

    #[test]
    fn select_on_empty_registry_warns() {
        let (_, session) = run("2\n0\n");
        assert!(
            output(session).contains("No devices available. Please add a new device first.")
        );
    }

    #[test]
    fn invalid_index_clears_selection() {
        let input = format!("{ADD_T1}2\n5\n5\n0\n");
        let (_, session) = run(&input);
        assert_eq!(session.registry().current_index(), None);
        let text = output(session);
        assert!(text.contains("Select device index (1 to 1): "));
        assert!(text.contains("Invalid device index."));
        assert!(text.contains("No device selected."));
    }

    #[test]
    fn measurement_scenario_reports_reading() {
        let input = format!("{ADD_T1}2\n1\n3\n6\n50\n5\n0\n");
        let (_, session) = run(&input);
        let text = output(session);
        assert!(text.contains("\nStart of measurement\nTemperature measurement started\n"));
        assert!(text.contains("Current Temperature: 50 C"));
        assert!(text.contains("Material: Metal"));
    }

    #[test]
    fn inactive_advanced_device_skips_calibration() {
        let input = format!("{ADD_ADV}6\n0\n");
        let (_, session) = run(&input);
        let text = output(session);
        assert!(text.contains("Device is not ACTIVE!!!"));
        assert!(!text.contains("Applying calibration offset"));
    }

    #[test]
    fn calibration_edit_on_plain_device_reports_variant() {
        let input = format!("{ADD_T1}7\n7\n0\n");
        let (_, session) = run(&input);
        assert!(
            output(session)
                .contains("Selected device is not an AdvancedTemperatureMeasurementDevice.")
        );
    }

    #[test]
    fn attribute_menu_rejects_unknown_entry() {
        let input = format!("{ADD_T1}7\n9\n0\n");
        let (_, session) = run(&input);
        let text = output(session);
        assert!(text.contains("Change attribute:"));
        assert!(text.contains("Invalid option.\n"));
    }

    #[test]
    fn device_limit_blocks_add_before_prompts() {
        let rules = SessionConfig {
            strict_range: false,
            max_devices: 1,
        };
        let input = format!("{ADD_T1}1\n1\n0\n");
        let mut session = session_with(&input, &rules);
        session.run().unwrap();
        assert_eq!(session.registry().len(), 1);
        let text = output(session);
        assert!(text.contains("Device limit reached (1). No device added."));
        assert_eq!(text.matches("Enter device name: ").count(), 1);
    }

    #[test]
    fn activity_log_records_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let input = format!("{ADD_T1}3\n6\n20\n9\n0\n");
        let prompter = Prompter::new(Cursor::new(input.into_bytes()), Vec::new());
        let mut session = Session::new(
            prompter,
            &SessionConfig::default(),
            ActivityLog::open(&path, Severity::Info),
        );
        session.run().unwrap();
        drop(session);

        let events: Vec<String> = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                value["event"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(
            events,
            vec![
                "session_start",
                "device_added",
                "measuring_started",
                "measurement_set",
                "command_rejected",
                "session_stop",
            ]
        );
    }

    fn read_log(path: &std::path::Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn menu_and_index_rejections_carry_warning_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let input = format!("9\n{ADD_T1}2\n4\n0\n");
        let prompter = Prompter::new(Cursor::new(input.into_bytes()), Vec::new());
        let mut session = Session::new(
            prompter,
            &SessionConfig::default(),
            ActivityLog::open(&path, Severity::Warning),
        );
        session.run().unwrap();
        drop(session);

        let entries = read_log(&path);
        assert_eq!(entries.len(), 2);
        for entry in &entries {
            assert_eq!(entry["event"], "command_rejected");
            assert_eq!(entry["severity"], "warning");
            assert_eq!(entry["error_code"], "MREG-2006");
        }
        assert!(entries[0]["details"].as_str().unwrap().contains("menu option"));
        assert!(entries[1]["details"].as_str().unwrap().contains("device index"));
    }

    struct BrokenTerminal;

    impl std::io::Read for BrokenTerminal {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("terminal detached"))
        }
    }

    #[test]
    fn terminal_failure_is_logged_as_critical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let prompter = Prompter::new(std::io::BufReader::new(BrokenTerminal), Vec::new());
        let mut session = Session::new(
            prompter,
            &SessionConfig::default(),
            ActivityLog::open(&path, Severity::Critical),
        );
        let err = session.run().unwrap_err();
        assert!(matches!(err, RegistryError::Terminal(_)));
        drop(session);

        let entries = read_log(&path);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["event"], "session_stop");
        assert_eq!(entries[0]["severity"], "critical");
        assert_eq!(entries[0]["error_code"], "MREG-3002");
    }
}
