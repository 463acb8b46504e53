use crate::material::ShaderDefinition;
use crate::parser::{parse_material_source, ParseError};
use crate::shader::Shader;
use itertools::Itertools;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// What a pass over the material files found
#[derive(Debug, Default)]
pub struct LoadReport {
    pub files: Vec<PathBuf>,
    /// definitions inserted, overwrites included
    pub parsed: usize,
    /// names declared more than once; the later declaration is the one kept
    pub overwritten: Vec<String>,
    pub errors: Vec<ParseError>,
}

/// Every material definition, and the shaders currently in use.
#[derive(Default)]
pub struct ShaderLibrary {
    definitions: BTreeMap<String, Rc<ShaderDefinition>>,
    shaders: BTreeMap<String, Shader>,
    loaded: bool,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Parse every `<base>/<dir>/*.<extension>` file, in name order.
    pub fn load_material_files(&mut self, base: &Path, dir: &str, extension: &str) -> LoadReport {
        let mut report = LoadReport::default();
        let material_dir = base.join(dir);

        let entries = match std::fs::read_dir(&material_dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!(
                    "unable to list material files in {}: {}",
                    material_dir.display(),
                    e
                );
                self.loaded = true;
                return report;
            }
        };

        let files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
            })
            .sorted()
            .collect();

        for path in &files {
            let text = match std::fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("unable to read material file {}: {}", path.display(), e);
                    continue;
                }
            };
            let file_name = path
                .strip_prefix(base)
                .unwrap_or(path.as_path())
                .to_string_lossy()
                .replace('\\', "/");
            self.insert_source(&file_name, &text, &mut report);
        }
        report.files = files;

        log::debug!(
            "parsed {} material definitions from {} files",
            report.parsed,
            report.files.len()
        );
        self.loaded = true;
        report
    }

    /// Parse one material file's text into the library.
    pub fn insert_source(&mut self, file: &str, text: &str, report: &mut LoadReport) {
        let (definitions, errors) = parse_material_source(file, text);

        for error in errors {
            log::warn!("skipping malformed material block: {}", error);
            report.errors.push(error);
        }

        for definition in definitions {
            self.insert_definition(definition, report);
        }
    }

    pub fn insert_definition(&mut self, definition: ShaderDefinition, report: &mut LoadReport) {
        let name = definition.name.clone();
        if let Some(previous) = self.definitions.get(&name) {
            log::warn!(
                "shader {} is defined in both {} and {}; using the latter",
                name,
                previous.file,
                definition.file
            );
            report.overwritten.push(name.clone());
        }
        self.definitions.insert(name, Rc::new(definition));
        report.parsed += 1;
    }

    pub fn definition(&self, name: &str) -> Option<&ShaderDefinition> {
        self.definitions.get(name).map(|rc| rc.as_ref())
    }

    pub fn definition_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.definitions.keys().map(|name| name.as_str())
    }

    pub fn definition_count(&self) -> usize {
        self.definitions.len()
    }

    /// The active shader for `name`, created on first request.  Never fails:
    /// unknown names get the not-found stub.
    pub fn find_shader(&mut self, name: &str) -> &mut Shader {
        let definitions = &self.definitions;
        self.shaders
            .entry(name.to_string())
            .or_insert_with(|| match definitions.get(name) {
                Some(definition) => Shader::new(Rc::clone(definition)),
                None => {
                    log::debug!("no definition for shader {}", name);
                    Shader::not_found(name)
                }
            })
    }

    pub fn shader(&self, name: &str) -> Option<&Shader> {
        self.shaders.get(name)
    }

    pub fn active_shaders(&self) -> impl Iterator<Item = &Shader> + '_ {
        self.shaders.values()
    }

    pub(crate) fn active_shaders_mut(&mut self) -> impl Iterator<Item = &mut Shader> + '_ {
        self.shaders.values_mut()
    }

    pub fn active_shader_count(&self) -> usize {
        self.shaders.len()
    }

    /// Forget every definition and active shader.  Active shaders must already
    /// be unrealised or their textures stay held.
    pub fn clear(&mut self) {
        self.shaders.clear();
        self.definitions.clear();
        self.loaded = false;
    }
}
