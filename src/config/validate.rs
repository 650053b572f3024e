// src/config/validate.rs

use std::path::{Component, Path, PathBuf};

use crate::config::model::{DriverSection, DriverSettings};
use crate::errors::{DriverError, Result};

impl TryFrom<DriverSection> for DriverSettings {
    type Error = DriverError;

    fn try_from(raw: DriverSection) -> std::result::Result<Self, Self::Error> {
        validate_section(&raw)?;

        Ok(DriverSettings {
            workdir: absolute("workdir", &raw.workdir)?,
            generator: absolute("generator", &raw.generator)?,
            renderer: absolute("renderer", &raw.renderer)?,
            log_dir: absolute("log_dir", &raw.log_dir)?,
            python: raw.python,
            config_file: raw.config_file,
            scene_file: PathBuf::from(raw.scene_file),
            output_image: raw.output_image,
        })
    }
}

fn validate_section(raw: &DriverSection) -> Result<()> {
    for (key, value) in [
        ("workdir", &raw.workdir),
        ("generator", &raw.generator),
        ("renderer", &raw.renderer),
        ("log_dir", &raw.log_dir),
        ("python", &raw.python),
    ] {
        if value.trim().is_empty() {
            return Err(DriverError::Settings(format!(
                "[driver].{key} must not be empty"
            )));
        }
    }

    ensure_bare_file_name("config_file", &raw.config_file)?;
    ensure_bare_file_name("output_image", &raw.output_image)?;
    ensure_relative_inside("scene_file", &raw.scene_file)?;
    Ok(())
}

/// A bare file name: exactly one normal component.
fn ensure_bare_file_name(key: &str, value: &str) -> Result<()> {
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(DriverError::Settings(format!(
            "[driver].{key} must be a plain file name (got {value:?})"
        ))),
    }
}

/// A relative path that never climbs out of its base directory.
fn ensure_relative_inside(key: &str, value: &str) -> Result<()> {
    let path = Path::new(value);
    let ok = !value.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if ok {
        Ok(())
    } else {
        Err(DriverError::Settings(format!(
            "[driver].{key} must be a relative path inside workdir (got {value:?})"
        )))
    }
}

fn absolute(key: &str, value: &str) -> Result<PathBuf> {
    std::path::absolute(value).map_err(|e| {
        DriverError::Settings(format!("[driver].{key}: cannot resolve {value:?}: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section() -> DriverSection {
        DriverSection {
            workdir: "work".into(),
            generator: "work/main.py".into(),
            renderer: "/opt/pbrt/pbrt".into(),
            log_dir: "log".into(),
            python: "python3".into(),
            config_file: "config.json".into(),
            scene_file: "scenes/target.pbrt".into(),
            output_image: "mc.png".into(),
        }
    }

    #[test]
    fn resolves_paths_to_absolute() {
        let settings = DriverSettings::try_from(section()).unwrap();
        assert!(settings.workdir.is_absolute());
        assert!(settings.log_dir.is_absolute());
        assert_eq!(settings.renderer, PathBuf::from("/opt/pbrt/pbrt"));
        assert!(settings.generator_is_script());
    }

    #[test]
    fn rejects_empty_renderer() {
        let mut raw = section();
        raw.renderer = "  ".into();
        match DriverSettings::try_from(raw) {
            Err(DriverError::Settings(msg)) => assert!(msg.contains("renderer")),
            other => panic!("expected Settings error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_config_file_with_directory() {
        let mut raw = section();
        raw.config_file = "../config.json".into();
        assert!(matches!(
            DriverSettings::try_from(raw),
            Err(DriverError::Settings(_))
        ));
    }

    #[test]
    fn rejects_scene_file_escaping_workdir() {
        let mut raw = section();
        raw.scene_file = "../outside.pbrt".into();
        assert!(matches!(
            DriverSettings::try_from(raw),
            Err(DriverError::Settings(_))
        ));

        let mut raw = section();
        raw.scene_file = "/abs/target.pbrt".into();
        assert!(matches!(
            DriverSettings::try_from(raw),
            Err(DriverError::Settings(_))
        ));
    }
}
