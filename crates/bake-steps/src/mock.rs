//! Doble en memoria de `CommandRunner`.
//!
//! Interpreta `mount`, `umount` y `grep <path> /proc/mounts` contra una tabla
//! de mounts simulada, de modo que los steps de mounts se pueden ejercitar
//! sin privilegios. Cualquier prefijo de envoltura (`sudo ...`) se ignora.

use std::io;
use std::sync::{Mutex, MutexGuard};

use crate::command::{CommandOutput, CommandRunner};

#[derive(Debug, Default)]
struct MockInner {
    commands: Vec<String>,
    mounted: Vec<String>,
    mount_log: Vec<String>,
    unmount_log: Vec<String>,
    failures: Vec<(String, CommandOutput)>,
    spawn_failures: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MockShell {
    inner: Mutex<MockInner>,
}

impl MockShell {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, MockInner> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Todas las líneas recibidas, tal cual (envueltas).
    pub fn commands(&self) -> Vec<String> {
        self.inner().commands.clone()
    }

    /// Destinos actualmente montados, en orden de montaje.
    pub fn mounted(&self) -> Vec<String> {
        self.inner().mounted.clone()
    }

    /// Destinos montados con éxito, en orden.
    pub fn mount_log(&self) -> Vec<String> {
        self.inner().mount_log.clone()
    }

    /// Destinos desmontados con éxito, en orden.
    pub fn unmount_log(&self) -> Vec<String> {
        self.inner().unmount_log.clone()
    }

    /// Hace fallar (una vez) el primer comando que contenga `pattern`.
    pub fn fail_once(&self, pattern: impl Into<String>, output: CommandOutput) {
        self.inner().failures.push((pattern.into(), output));
    }

    /// Hace que lanzar un comando que contenga `pattern` falle con un error de IO.
    pub fn fail_spawn(&self, pattern: impl Into<String>) {
        self.inner().spawn_failures.push(pattern.into());
    }

    /// Simula que otro agente desmontó `target`.
    pub fn unmount_externally(&self, target: &str) {
        self.inner().mounted.retain(|m| m != target);
    }

    /// Simula un mount hecho fuera del step.
    pub fn mount_externally(&self, target: &str) {
        self.inner().mounted.push(target.to_string());
    }
}

impl CommandRunner for MockShell {
    fn run(&self, command: &str) -> io::Result<CommandOutput> {
        let mut inner = self.inner();
        inner.commands.push(command.to_string());

        if inner.spawn_failures.iter().any(|p| command.contains(p.as_str())) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "mock: cannot spawn shell"));
        }
        if let Some(pos) = inner.failures.iter().position(|(p, _)| command.contains(p.as_str())) {
            let (_, output) = inner.failures.remove(pos);
            return Ok(output);
        }

        let tokens: Vec<&str> = command.split_whitespace().collect();
        let Some(verb_at) = tokens.iter().position(|t| matches!(*t, "mount" | "umount" | "grep")) else {
            return Ok(CommandOutput::ok());
        };
        let args = &tokens[verb_at + 1..];
        match tokens[verb_at] {
            "mount" => {
                let Some(target) = args.last() else {
                    return Ok(CommandOutput::failed(1, "mount: missing target"));
                };
                inner.mounted.push(target.to_string());
                inner.mount_log.push(target.to_string());
                Ok(CommandOutput::ok())
            }
            "umount" => {
                let target = args.last().copied().unwrap_or_default();
                match inner.mounted.iter().rposition(|m| m == target) {
                    Some(pos) => {
                        inner.mounted.remove(pos);
                        inner.unmount_log.push(target.to_string());
                        Ok(CommandOutput::ok())
                    }
                    None => Ok(CommandOutput::failed(32, format!("umount: {target}: not mounted."))),
                }
            }
            _ => {
                // grep <pattern> /proc/mounts
                let pattern = args.first().copied().unwrap_or_default();
                if inner.mounted.iter().any(|m| m.contains(pattern)) {
                    Ok(CommandOutput { code: Some(0),
                                       stdout: format!("none {pattern} none rw 0 0\n"),
                                       stderr: String::new() })
                } else {
                    Ok(CommandOutput::failed(1, ""))
                }
            }
        }
    }
}
