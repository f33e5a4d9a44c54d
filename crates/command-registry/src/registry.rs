//! Install/teardown orchestration.

use crate::{CommandRegistrationApi, RegistrationResult};
use interaction_protocol_types::CommandDescriptor;
use std::sync::Arc;
use tracing::{info, warn};

/// What a sync run should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Install,
    Teardown,
}

/// Outcome counts of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub upserted: usize,
    pub deleted: usize,
    /// Teardown deletions that failed and were skipped.
    pub failed: usize,
}

/// Drives the registration API for one application.
#[derive(Clone)]
pub struct CommandRegistry {
    api: Arc<dyn CommandRegistrationApi>,
}

impl CommandRegistry {
    pub fn new(api: Arc<dyn CommandRegistrationApi>) -> Self {
        Self { api }
    }

    /// Bring the platform in line with `commands` (install) or remove
    /// everything registered (teardown). Calls are made one at a time.
    pub async fn sync(
        &self,
        commands: &[CommandDescriptor],
        mode: SyncMode,
    ) -> RegistrationResult<SyncReport> {
        match mode {
            SyncMode::Install => self.install(commands).await,
            SyncMode::Teardown => self.teardown().await,
        }
    }

    async fn install(&self, commands: &[CommandDescriptor]) -> RegistrationResult<SyncReport> {
        for command in commands {
            command.validate()?;
        }

        let mut report = SyncReport::default();
        for command in commands {
            let registered = self.api.upsert(command).await?;
            info!(command = %registered.name, id = %registered.id, "Command installed");
            report.upserted += 1;
        }
        Ok(report)
    }

    async fn teardown(&self) -> RegistrationResult<SyncReport> {
        let mut report = SyncReport::default();
        let registered = match self.api.list().await {
            Ok(registered) => registered,
            Err(e) => {
                warn!(error = %e, "Could not list registered commands, nothing removed");
                return Ok(report);
            }
        };

        for command in registered {
            match self.api.delete(&command.id).await {
                Ok(()) => {
                    info!(command = %command.name, id = %command.id, "Command removed");
                    report.deleted += 1;
                }
                Err(e) => {
                    warn!(command = %command.name, id = %command.id, error = %e, "Failed to remove command");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RegistrationError;
    use async_trait::async_trait;
    use interaction_protocol_types::{ArgumentSpec, RegisteredCommand};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// In-memory platform keyed by command name, like the real upsert.
    #[derive(Default)]
    struct FakePlatform {
        commands: Mutex<BTreeMap<String, (String, CommandDescriptor)>>,
        next_id: Mutex<u64>,
        fail_upsert_of: Option<String>,
        fail_delete_of: Option<String>,
        fail_list: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakePlatform {
        fn names(&self) -> Vec<String> {
            self.commands.lock().unwrap().keys().cloned().collect()
        }

        fn ids(&self) -> Vec<String> {
            self.commands
                .lock()
                .unwrap()
                .values()
                .map(|(id, _)| id.clone())
                .collect()
        }

        fn api_error(operation: &str) -> RegistrationError {
            RegistrationError::Api {
                status: 500,
                operation: operation.to_string(),
                message: "boom".to_string(),
            }
        }
    }

    #[async_trait]
    impl CommandRegistrationApi for FakePlatform {
        async fn upsert(&self, command: &CommandDescriptor) -> RegistrationResult<RegisteredCommand> {
            self.calls.lock().unwrap().push(format!("upsert {}", command.name));
            if self.fail_upsert_of.as_deref() == Some(command.name.as_str()) {
                return Err(Self::api_error("upsert"));
            }
            let mut commands = self.commands.lock().unwrap();
            let id = match commands.get(&command.name) {
                Some((id, _)) => id.clone(),
                None => {
                    let mut next = self.next_id.lock().unwrap();
                    *next += 1;
                    next.to_string()
                }
            };
            commands.insert(command.name.clone(), (id.clone(), command.clone()));
            Ok(RegisteredCommand {
                id,
                name: command.name.clone(),
            })
        }

        async fn list(&self) -> RegistrationResult<Vec<RegisteredCommand>> {
            if self.fail_list {
                return Err(Self::api_error("list"));
            }
            Ok(self
                .commands
                .lock()
                .unwrap()
                .iter()
                .map(|(name, (id, _))| RegisteredCommand {
                    id: id.clone(),
                    name: name.clone(),
                })
                .collect())
        }

        async fn delete(&self, command_id: &str) -> RegistrationResult<()> {
            self.calls.lock().unwrap().push(format!("delete {command_id}"));
            let mut commands = self.commands.lock().unwrap();
            let name = commands
                .iter()
                .find(|(_, (id, _))| id == command_id)
                .map(|(name, _)| name.clone());
            if let Some(name) = name {
                if self.fail_delete_of.as_deref() == Some(name.as_str()) {
                    return Err(Self::api_error("delete"));
                }
                commands.remove(&name);
            }
            Ok(())
        }
    }

    fn commands() -> Vec<CommandDescriptor> {
        vec![
            CommandDescriptor::new("version", "Show the running build"),
            CommandDescriptor::new("generate", "Generate an image")
                .argument(ArgumentSpec::string("image-prompt", "What to draw").required()),
        ]
    }

    #[tokio::test]
    async fn install_registers_every_command() {
        let platform = Arc::new(FakePlatform::default());
        let registry = CommandRegistry::new(platform.clone());

        let report = registry.sync(&commands(), SyncMode::Install).await.unwrap();
        assert_eq!(report.upserted, 2);
        assert_eq!(platform.names(), ["generate", "version"]);
    }

    #[tokio::test]
    async fn repeated_install_is_idempotent() {
        let platform = Arc::new(FakePlatform::default());
        let registry = CommandRegistry::new(platform.clone());

        registry.sync(&commands(), SyncMode::Install).await.unwrap();
        let ids_after_first = platform.ids();
        registry.sync(&commands(), SyncMode::Install).await.unwrap();

        assert_eq!(platform.names(), ["generate", "version"]);
        assert_eq!(platform.ids(), ids_after_first);
    }

    #[tokio::test]
    async fn install_failure_is_fatal_and_stops() {
        let platform = Arc::new(FakePlatform {
            fail_upsert_of: Some("version".to_string()),
            ..Default::default()
        });
        let registry = CommandRegistry::new(platform.clone());

        let err = registry.sync(&commands(), SyncMode::Install).await.unwrap_err();
        assert!(matches!(err, RegistrationError::Api { status: 500, .. }));
        assert_eq!(*platform.calls.lock().unwrap(), ["upsert version"]);
    }

    #[tokio::test]
    async fn invalid_descriptor_fails_before_any_call() {
        let platform = Arc::new(FakePlatform::default());
        let registry = CommandRegistry::new(platform.clone());
        let mut bad = commands();
        bad.push(CommandDescriptor::new("Bad Name", "x"));

        let err = registry.sync(&bad, SyncMode::Install).await.unwrap_err();
        assert!(matches!(err, RegistrationError::Descriptor(_)));
        assert!(platform.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn teardown_removes_everything() {
        let platform = Arc::new(FakePlatform::default());
        let registry = CommandRegistry::new(platform.clone());
        registry.sync(&commands(), SyncMode::Install).await.unwrap();

        let report = registry.sync(&[], SyncMode::Teardown).await.unwrap();
        assert_eq!(report.deleted, 2);
        assert_eq!(report.failed, 0);
        assert!(platform.names().is_empty());
    }

    #[tokio::test]
    async fn teardown_failures_are_counted_not_fatal() {
        let platform = Arc::new(FakePlatform {
            fail_delete_of: Some("generate".to_string()),
            ..Default::default()
        });
        let registry = CommandRegistry::new(platform.clone());
        registry.sync(&commands(), SyncMode::Install).await.unwrap();

        let report = registry.sync(&[], SyncMode::Teardown).await.unwrap();
        assert_eq!(report.deleted, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(platform.names(), ["generate"]);
    }

    #[tokio::test]
    async fn teardown_survives_list_failure() {
        let platform = Arc::new(FakePlatform {
            fail_list: true,
            ..Default::default()
        });
        let registry = CommandRegistry::new(platform);
        let report = registry.sync(&[], SyncMode::Teardown).await.unwrap();
        assert_eq!(report, SyncReport::default());
    }
}
