//! Claves de estado propias de los steps de este crate y sus accesores.

use bake_core::StateBag;

use std::sync::Arc;

use crate::command::{CommandWrapper, SharedRunner, ShellCommandRunner};

/// Envoltura de comandos (`CommandWrapper`).
pub const WRAPPED_COMMAND: &str = "wrappedCommand";
/// Ejecutor de comandos (`SharedRunner`).
pub const COMMAND_RUNNER: &str = "command_runner";
/// Handle de limpieza temprana publicado por `StepMountExtra`.
pub const MOUNT_EXTRA_CLEANUP: &str = "mount_extra_cleanup";

/// Accesores tipados sobre `StateBag` para los colaboradores de comandos.
pub trait CommandState {
    /// Envoltura requerida; el caller la instala antes de correr.
    fn command_wrapper(&self) -> CommandWrapper;
    fn set_command_wrapper(&self, wrapper: CommandWrapper);
    /// Ejecutor instalado, o `ShellCommandRunner` si no hay ninguno.
    fn command_runner(&self) -> SharedRunner;
    fn set_command_runner(&self, runner: SharedRunner);
}

impl CommandState for StateBag {
    fn command_wrapper(&self) -> CommandWrapper {
        self.get(WRAPPED_COMMAND)
    }

    fn set_command_wrapper(&self, wrapper: CommandWrapper) {
        self.put(WRAPPED_COMMAND, wrapper);
    }

    fn command_runner(&self) -> SharedRunner {
        // Se guarda como `SharedRunner`, no como el tipo concreto.
        self.get_ok::<SharedRunner>(COMMAND_RUNNER)
            .unwrap_or_else(|| Arc::new(ShellCommandRunner::new()))
    }

    fn set_command_runner(&self, runner: SharedRunner) {
        self.put(COMMAND_RUNNER, runner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::identity_wrapper;
    use crate::mock::MockShell;

    #[test]
    fn runner_defaults_to_shell_and_can_be_replaced() {
        let state = StateBag::new();
        let mock = Arc::new(MockShell::new());
        state.set_command_runner(mock.clone());
        state.command_runner().run("mount -t proc proc /x").unwrap();
        assert_eq!(mock.mounted(), vec!["/x"]);
        assert_eq!(mock.commands(), vec!["mount -t proc proc /x"]);

        state.remove(COMMAND_RUNNER);
        let _default: SharedRunner = state.command_runner();
        assert_eq!(mock.commands().len(), 1);
    }

    #[test]
    fn installed_runner_is_returned_on_every_lookup() {
        let state = StateBag::new();
        let mock = Arc::new(MockShell::new());
        state.set_command_runner(mock.clone());
        for _ in 0..2 {
            state.command_runner().run("grep /x /proc/mounts").unwrap();
        }
        assert_eq!(mock.commands().len(), 2);
    }

    #[test]
    fn wrapper_roundtrips_through_state() {
        let state = StateBag::new();
        state.set_command_wrapper(identity_wrapper());
        assert_eq!(state.command_wrapper()("umount /x").unwrap(), "umount /x");
    }

    #[test]
    #[should_panic(expected = "wrappedCommand")]
    fn missing_wrapper_is_a_contract_violation() {
        StateBag::new().command_wrapper();
    }
}
