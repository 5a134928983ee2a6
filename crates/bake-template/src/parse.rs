//! Lectura de plantillas JSON.
//!
//! El documento se decodifica primero a `serde_json::Value` y luego se
//! recorre a mano: así se pueden acumular todos los errores de builders y
//! provisioners en una sola pasada en lugar de parar en el primero.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::{Map, Value};

use crate::errors::{TemplateError, TemplateErrors};
use crate::types::{Builder, Provisioner, Template};

/// Claves admitidas en la raíz de la plantilla.
pub const ROOT_KEYS: &[&str] =
    &["min_packer_version", "description", "builders", "push", "post-processors", "provisioners", "variables"];

pub fn parse<R: Read>(reader: R) -> Result<Template, TemplateErrors> {
    let raw: Value = serde_json::from_reader(reader).map_err(TemplateError::from)?;
    from_value(raw)
}

pub fn parse_str(input: &str) -> Result<Template, TemplateErrors> {
    parse(input.as_bytes())
}

pub fn parse_file(path: impl AsRef<Path>) -> Result<Template, TemplateErrors> {
    let file = File::open(path.as_ref()).map_err(TemplateError::from)?;
    log::debug!("parsing template {}", path.as_ref().display());
    parse(BufReader::new(file))
}

/// Construye la plantilla a partir de un documento ya decodificado.
pub fn from_value(raw: Value) -> Result<Template, TemplateErrors> {
    let Value::Object(mut root) = raw else {
        return Err(TemplateError::NotAnObject.into());
    };

    let mut unknown: Vec<String> = root.keys()
                                       .filter(|k| !ROOT_KEYS.contains(&k.as_str()))
                                       .cloned()
                                       .collect();
    if !unknown.is_empty() {
        unknown.sort();
        return Err(TemplateErrors(unknown.into_iter().map(TemplateError::UnknownRootKey).collect()));
    }

    let mut errs = Vec::new();
    let mut template = Template::default();

    let root_err = |key: &str, reason: String| TemplateError::InvalidRootKey { key: key.to_string(),
                                                                                   reason };

    match take_string(&mut root, "min_packer_version") {
        Ok(v) => template.min_version = v,
        Err(reason) => errs.push(root_err("min_packer_version", reason)),
    }
    match take_string(&mut root, "description") {
        Ok(v) => template.description = v,
        Err(reason) => errs.push(root_err("description", reason)),
    }
    match take_object(&mut root, "push") {
        Ok(v) => template.push = v,
        Err(reason) => errs.push(root_err("push", reason)),
    }
    match take_object(&mut root, "variables") {
        Ok(v) => template.variables = v.unwrap_or_default(),
        Err(reason) => errs.push(root_err("variables", reason)),
    }
    match take_array(&mut root, "post-processors") {
        Ok(v) => template.post_processors = v,
        Err(reason) => errs.push(root_err("post-processors", reason)),
    }

    match take_array(&mut root, "builders") {
        Ok(items) => {
            for (i, item) in items.into_iter().enumerate() {
                let index = i + 1;
                match decode_builder(item) {
                    Ok(b) if template.builders.contains_key(&b.name) => {
                        errs.push(TemplateError::Builder { index,
                                                           reason: format!("builder with name '{}' already exists",
                                                                           b.name) });
                    }
                    Ok(b) => {
                        template.builders.insert(b.name.clone(), b);
                    }
                    Err(reason) => errs.push(TemplateError::Builder { index, reason }),
                }
            }
        }
        Err(reason) => errs.push(root_err("builders", reason)),
    }

    match take_array(&mut root, "provisioners") {
        Ok(items) => {
            for (i, item) in items.into_iter().enumerate() {
                match decode_provisioner(item) {
                    Ok(p) => template.provisioners.push(p),
                    Err(reason) => errs.push(TemplateError::Provisioner { index: i + 1,
                                                                          reason }),
                }
            }
        }
        Err(reason) => errs.push(root_err("provisioners", reason)),
    }

    if errs.is_empty() {
        log::debug!("template parsed: {} builder(s), {} provisioner(s)",
                    template.builders.len(),
                    template.provisioners.len());
        Ok(template)
    } else {
        Err(TemplateErrors(errs))
    }
}

fn decode_builder(item: Value) -> Result<Builder, String> {
    let Value::Object(mut config) = item else {
        return Err(format!("expected an object, got {}", type_name(&item)));
    };
    let name = take_string(&mut config, "name")?;
    let kind = take_string(&mut config, "type")?.ok_or_else(|| "missing 'type'".to_string())?;
    Ok(Builder { name: name.unwrap_or_else(|| kind.clone()),
                 kind,
                 config })
}

fn decode_provisioner(item: Value) -> Result<Provisioner, String> {
    let Value::Object(mut config) = item else {
        return Err(format!("expected an object, got {}", type_name(&item)));
    };
    let kind = take_string(&mut config, "type")?.ok_or_else(|| "missing 'type'".to_string())?;
    Ok(Provisioner { kind,
                     only: take_string_list(&mut config, "only")?,
                     except: take_string_list(&mut config, "except")?,
                     overrides: take_object(&mut config, "override")?.unwrap_or_default(),
                     pause_before: take_string(&mut config, "pause_before")?,
                     config })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Saca `key` como texto. Vacío o `null` cuentan como ausente; números y
/// booleanos se aceptan en su forma textual.
fn take_string(map: &mut Map<String, Value>, key: &str) -> Result<Option<String>, String> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(v.to_string())),
        Some(other) => Err(format!("'{key}' expected type 'string', got {}", type_name(&other))),
    }
}

fn take_string_list(map: &mut Map<String, Value>, key: &str) -> Result<Vec<String>, String> {
    take_array(map, key)?.into_iter()
                         .map(|v| match v {
                             Value::String(s) => Ok(s),
                             other => Err(format!("'{key}' expected a list of strings, found {}",
                                                  type_name(&other))),
                         })
                         .collect()
}

fn take_array(map: &mut Map<String, Value>, key: &str) -> Result<Vec<Value>, String> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(format!("'{key}' expected a list, got {}", type_name(&other))),
    }
}

fn take_object(map: &mut Map<String, Value>, key: &str) -> Result<Option<Map<String, Value>>, String> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(obj)) => Ok(Some(obj)),
        Some(other) => Err(format!("'{key}' expected an object, got {}", type_name(&other))),
    }
}
