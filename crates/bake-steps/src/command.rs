//! Colaboradores de comandos: envoltura (p. ej. elevación de privilegios) y
//! ejecución.
//!
//! Los steps nunca construyen `std::process::Command` directamente: piden al
//! `CommandWrapper` la línea final y se la pasan a un `CommandRunner`. Así
//! los tests pueden sustituir la ejecución por un doble en memoria.

use std::io;
use std::process::{Command, Stdio};
use std::sync::Arc;

use thiserror::Error;

/// Marcador que una plantilla de envoltura debe contener.
pub const COMMAND_PLACEHOLDER: &str = "{{.Command}}";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WrapError {
    #[error("command wrapper template {0:?} does not contain {{{{.Command}}}}")]
    MissingPlaceholder(String),
    #[error("refusing to wrap an empty command")]
    EmptyCommand,
}

/// Función que transforma un comando de shell en el comando a ejecutar.
pub type CommandWrapper = Arc<dyn Fn(&str) -> Result<String, WrapError> + Send + Sync>;

/// Envoltura que deja el comando tal cual.
pub fn identity_wrapper() -> CommandWrapper {
    Arc::new(|command: &str| {
        if command.trim().is_empty() {
            return Err(WrapError::EmptyCommand);
        }
        Ok(command.to_string())
    })
}

/// Envoltura a partir de una plantilla como `sudo {{.Command}}`.
///
/// La plantilla se valida al envolver, no al construir: una plantilla mala
/// se manifiesta como error del step que intenta usarla.
pub fn template_wrapper(template: impl Into<String>) -> CommandWrapper {
    let template = template.into();
    Arc::new(move |command: &str| {
        if command.trim().is_empty() {
            return Err(WrapError::EmptyCommand);
        }
        if !template.contains(COMMAND_PLACEHOLDER) {
            return Err(WrapError::MissingPlaceholder(template.clone()));
        }
        Ok(template.replace(COMMAND_PLACEHOLDER, command))
    })
}

/// Resultado de ejecutar un comando.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Código de salida; `None` si el proceso terminó por señal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok() -> Self {
        Self { code: Some(0),
               ..Self::default() }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self { code: Some(code),
               stdout: String::new(),
               stderr: stderr.into() }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Descripción corta del estado de salida, para mensajes de error.
    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Ejecuta líneas de shell ya envueltas.
pub trait CommandRunner: Send + Sync {
    /// `Err` sólo si no se pudo lanzar el proceso; un código de salida
    /// distinto de cero llega como `Ok` con `code` poblado.
    fn run(&self, command: &str) -> io::Result<CommandOutput>;
}

pub type SharedRunner = Arc<dyn CommandRunner>;

/// Ejecuta mediante `<shell> -c <command>`.
#[derive(Debug, Clone)]
pub struct ShellCommandRunner {
    program: String,
}

impl Default for ShellCommandRunner {
    fn default() -> Self {
        Self { program: "/bin/sh".to_string() }
    }
}

impl ShellCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl CommandRunner for ShellCommandRunner {
    fn run(&self, command: &str) -> io::Result<CommandOutput> {
        log::debug!("exec: {} -c {command:?}", self.program);
        let output = Command::new(&self.program).arg("-c")
                                                .arg(command)
                                                .stdin(Stdio::null())
                                                .stdout(Stdio::piped())
                                                .stderr(Stdio::piped())
                                                .output()?;
        Ok(CommandOutput { code: output.status.code(),
                           stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                           stderr: String::from_utf8_lossy(&output.stderr).into_owned() })
    }
}
