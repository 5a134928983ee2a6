//! Plantillas JSON de bake y la configuración de builders `chroot`.

pub mod chroot;
pub mod errors;
pub mod parse;
pub mod types;

pub use chroot::{default_mounts, ChrootConfig, CHROOT_BUILDER};
pub use errors::{TemplateError, TemplateErrors};
pub use parse::{from_value, parse, parse_file, parse_str, ROOT_KEYS};
pub use types::{Builder, Provisioner, Template};
