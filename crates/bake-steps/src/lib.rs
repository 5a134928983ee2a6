//! Steps concretos de bake: montajes dentro del chroot y directorio de
//! salida, más los colaboradores de comandos que usan.

pub mod command;
pub mod keys;
pub mod mock;
pub mod mount_extra;
pub mod output_dir;

pub use command::{identity_wrapper, template_wrapper, CommandOutput, CommandRunner, CommandWrapper, SharedRunner,
                  ShellCommandRunner, WrapError, COMMAND_PLACEHOLDER};
pub use keys::{CommandState, COMMAND_RUNNER, MOUNT_EXTRA_CLEANUP, WRAPPED_COMMAND};
pub use mock::MockShell;
pub use mount_extra::{MountError, MountExtraCleanup, MountSpec, StepMountExtra, BIND_KIND};
pub use output_dir::{OutputDirError, StepOutputDir, DEFAULT_REMOVAL_ATTEMPTS, DEFAULT_RETRY_DELAY, PERMISSION_PROBE};
