//! Sink de salida para el usuario.
//!
//! Los steps nunca escriben directamente a stdout/stderr: reciben un `Ui`
//! desde el `StateBag` (clave `ui`). La presentación real queda fuera del core.

use std::io::Write;
use std::sync::{Arc, Mutex};

/// Canal de mensajes legibles para el usuario.
pub trait Ui: Send + Sync + std::fmt::Debug {
    /// Mensaje de progreso principal.
    fn say(&self, message: &str);
    /// Mensaje secundario (detalle de un paso).
    fn message(&self, message: &str);
    /// Mensaje de error.
    fn error(&self, message: &str);
}

/// Handle compartible guardado en el estado.
pub type SharedUi = Arc<dyn Ui>;

/// `Ui` que escribe líneas prefijadas en un `Write`.
pub struct BasicUi<W: Write + Send> {
    out: Mutex<W>,
    err: Mutex<W>,
}

impl<W: Write + Send> BasicUi<W> {
    pub fn new(out: W, err: W) -> Self {
        Self { out: Mutex::new(out),
               err: Mutex::new(err) }
    }

    fn write_line(target: &Mutex<W>, line: &str) {
        // Un writer envenenado no debe tumbar el pipeline; la línea se pierde.
        if let Ok(mut w) = target.lock() {
            let _ = writeln!(w, "{line}");
            let _ = w.flush();
        }
    }
}

impl<W: Write + Send> std::fmt::Debug for BasicUi<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicUi").finish_non_exhaustive()
    }
}

impl BasicUi<Box<dyn Write + Send>> {
    /// `Ui` sobre stdout/stderr del proceso.
    pub fn stdio() -> Self {
        Self::new(Box::new(std::io::stdout()), Box::new(std::io::stderr()))
    }
}

impl<W: Write + Send> Ui for BasicUi<W> {
    fn say(&self, message: &str) {
        Self::write_line(&self.out, &format!("==> {message}"));
    }

    fn message(&self, message: &str) {
        Self::write_line(&self.out, &format!("    {message}"));
    }

    fn error(&self, message: &str) {
        Self::write_line(&self.err, message);
    }
}

/// Línea capturada por `MemoryUi`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiLine {
    Say(String),
    Message(String),
    Error(String),
}

/// `Ui` en memoria para tests.
#[derive(Debug, Default)]
pub struct MemoryUi {
    lines: Mutex<Vec<UiLine>>,
}

impl MemoryUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<UiLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Sólo los mensajes de error, en orden.
    pub fn errors(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|l| match l {
                UiLine::Error(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    fn push(&self, line: UiLine) {
        if let Ok(mut l) = self.lines.lock() {
            l.push(line);
        }
    }
}

impl Ui for MemoryUi {
    fn say(&self, message: &str) {
        self.push(UiLine::Say(message.to_string()));
    }

    fn message(&self, message: &str) {
        self.push(UiLine::Message(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(UiLine::Error(message.to_string()));
    }
}
