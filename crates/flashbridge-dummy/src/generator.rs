//! Emulated configuration generator and companion session

use crate::State;
use flashbridge_core::{CompanionSession, ConfigGenerator, DeviceError, DeviceResult};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Writes minimal board configuration files
pub struct DummyConfigGenerator {
    state: Rc<RefCell<State>>,
    directory: Option<PathBuf>,
    connection: Option<String>,
    device: Option<String>,
}

impl DummyConfigGenerator {
    pub(crate) fn new(state: Rc<RefCell<State>>) -> Self {
        Self {
            state,
            directory: None,
            connection: None,
            device: None,
        }
    }

    fn render(connection: &str, device: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n\
             <configurations XML_version=\"1.2\" id=\"configurations_0\">\n\
             \x20   <configuration id=\"{connection}\">\n\
             \x20       <instance XML_version=\"1.2\" desc=\"{connection}\" href=\"connections/{connection}\" id=\"{connection}\"/>\n\
             \x20       <platform>\n\
             \x20           <instance XML_version=\"1.2\" desc=\"{device}\" href=\"devices/{device}\" id=\"{device}\"/>\n\
             \x20       </platform>\n\
             \x20   </configuration>\n\
             </configurations>\n"
        )
    }
}

impl ConfigGenerator for DummyConfigGenerator {
    fn set_output_directory(&mut self, dir: &Path) -> DeviceResult<()> {
        self.state.borrow_mut().record("set_output_directory")?;
        if !dir.is_dir() {
            return Err(DeviceError::new(format!(
                "output directory {} does not exist",
                dir.display()
            )));
        }
        self.directory = Some(dir.to_path_buf());
        Ok(())
    }

    fn set_connection(&mut self, connection: &str) -> DeviceResult<()> {
        let mut state = self.state.borrow_mut();
        state.record("set_connection")?;
        if !state.config.connections.iter().any(|c| c == connection) {
            return Err(DeviceError::new(format!("unknown connection '{}'", connection)));
        }
        self.connection = Some(connection.to_string());
        Ok(())
    }

    fn set_device(&mut self, device: &str) -> DeviceResult<()> {
        let mut state = self.state.borrow_mut();
        state.record("set_device")?;
        if !state.config.devices.iter().any(|d| d == device) {
            return Err(DeviceError::new(format!("unknown device '{}'", device)));
        }
        self.device = Some(device.to_string());
        Ok(())
    }

    fn create_configuration(&mut self, name: &str) -> DeviceResult<()> {
        self.state.borrow_mut().record("create_configuration")?;
        let (Some(dir), Some(connection), Some(device)) =
            (&self.directory, &self.connection, &self.device)
        else {
            return Err(DeviceError::new(
                "output directory, connection and device must be set first",
            ));
        };

        let path = dir.join(name);
        std::fs::write(&path, Self::render(connection, device))?;
        log::debug!("dummy: wrote {}", path.display());
        Ok(())
    }

    fn list_connections(&mut self) -> DeviceResult<Vec<String>> {
        let mut state = self.state.borrow_mut();
        state.record("list_connections")?;
        Ok(state.config.connections.clone())
    }

    fn list_devices(&mut self) -> DeviceResult<Vec<String>> {
        let mut state = self.state.borrow_mut();
        state.record("list_devices")?;
        Ok(state.config.devices.clone())
    }

    fn list_configurations(&mut self) -> DeviceResult<Vec<String>> {
        let mut state = self.state.borrow_mut();
        state.record("list_configurations")?;
        Ok(state.config.configurations.clone())
    }
}

/// Companion session opened by `attach`
pub struct DummyCompanion {
    state: Rc<RefCell<State>>,
    cpu: String,
}

impl DummyCompanion {
    pub(crate) fn new(state: Rc<RefCell<State>>, cpu: String) -> Self {
        Self { state, cpu }
    }
}

impl CompanionSession for DummyCompanion {
    fn terminate(&mut self) -> DeviceResult<()> {
        log::debug!("dummy: closing companion session on {}", self.cpu);
        self.state.borrow_mut().record("companion_terminate")
    }
}

#[cfg(test)]
mod tests {
    use crate::DummyServer;
    use flashbridge_core::DebugServer;

    #[test]
    fn test_create_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = DummyServer::new_default();
        let mut generator = server.config_generator().unwrap();

        assert!(generator.create_configuration("board.ccxml").is_err());
        generator.set_output_directory(dir.path()).unwrap();
        generator
            .set_connection("Texas Instruments XDS110 USB Debug Probe")
            .unwrap();
        generator.set_device("MSP432P401R").unwrap();
        generator.create_configuration("board.ccxml").unwrap();

        let content = std::fs::read_to_string(dir.path().join("board.ccxml")).unwrap();
        assert!(content.contains("href=\"devices/MSP432P401R\""));
        assert!(content.contains("Texas Instruments XDS110 USB Debug Probe"));
    }

    #[test]
    fn test_unknown_connection_and_device() {
        let mut server = DummyServer::new_default();
        let mut generator = server.config_generator().unwrap();
        assert!(generator.set_connection("Bogus Probe").is_err());
        assert!(generator.set_device("Z80").is_err());
        assert!(generator
            .set_output_directory(std::path::Path::new("/nonexistent/dir"))
            .is_err());
    }

    #[test]
    fn test_lists() {
        let mut server = DummyServer::new_default();
        let mut generator = server.config_generator().unwrap();
        assert_eq!(generator.list_connections().unwrap().len(), 2);
        assert_eq!(
            generator.list_devices().unwrap(),
            vec!["MSP432P401R".to_string(), "CC1310F128".to_string()]
        );
        assert_eq!(generator.list_configurations().unwrap().len(), 1);
    }

    #[test]
    fn test_companion() {
        let mut server = DummyServer::new_default();
        let journal = server.journal();
        let mut companion = server.open_companion(".*").unwrap();
        companion.terminate().unwrap();
        assert_eq!(journal.count("companion_terminate"), 1);
        assert!(server.open_companion(".*TM4C.*").is_err());
    }
}
