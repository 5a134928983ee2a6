use bake_core::CoreEngineError;
use bake_template::TemplateErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BakeError {
    #[error("no template given; pass a path or set BAKE_TEMPLATE")]
    NoTemplate,
    #[error(transparent)]
    Template(#[from] TemplateErrors),
    #[error("template has no chroot builder")]
    NoChrootBuilder,
    #[error("builder '{0}' not found in template")]
    UnknownBuilder(String),
    #[error("template defines several chroot builders ({0}); choose one with BAKE_BUILDER")]
    AmbiguousBuilder(String),
    #[error("builder '{0}' has no mount_path; set it in the template or BAKE_MOUNT_ROOT")]
    MissingMountPath(String),
    #[error(transparent)]
    Engine(#[from] CoreEngineError),
}
