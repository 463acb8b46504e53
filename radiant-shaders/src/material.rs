use bitflags::bitflags;

bitflags! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct MaterialFlags: u32 {
        const TRANSLUCENT = 1 << 0;
        const TWO_SIDED = 1 << 1;
        const NO_SHADOWS = 1 << 2;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageBlend {
    Diffuse,
    Bump,
    Specular,
    /// any other blend mode, as written (`add`, `gl_one, gl_zero`, ...)
    Other(String),
}

impl StageBlend {
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_lowercase().as_str() {
            "diffusemap" => StageBlend::Diffuse,
            "bumpmap" => StageBlend::Bump,
            "specularmap" => StageBlend::Specular,
            _ => StageBlend::Other(keyword.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterialStage {
    pub blend: StageBlend,
    /// image reference, already reduced to its primary image path
    pub map: Option<String>,
}

/// A parsed material declaration.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ShaderDefinition {
    pub name: String,
    /// material file this definition was read from, empty for generated ones
    pub file: String,
    pub description: String,
    pub editor_image: Option<String>,
    pub diffuse: Option<String>,
    pub bump: Option<String>,
    pub specular: Option<String>,
    pub stages: Vec<MaterialStage>,
    pub flags: MaterialFlags,
}

impl ShaderDefinition {
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            ..Default::default()
        }
    }

    /// Stand-in for names nobody declared.  Keeps the requested name so the
    /// editor can still show what was asked for.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::new(name, "")
    }

    pub fn is_translucent(&self) -> bool {
        self.flags.contains(MaterialFlags::TRANSLUCENT)
    }

    /// The image shown in editor views: `qer_editorimage`, else the diffuse map,
    /// else the first stage that has an image.
    pub fn editor_image_reference(&self) -> Option<&str> {
        self.editor_image
            .as_deref()
            .or(self.diffuse.as_deref())
            .or_else(|| self.stages.iter().find_map(|stage| stage.map.as_deref()))
    }

    /// Fill the diffuse/bump/specular shortcuts from the stage list where the
    /// declaration only gave them as stages.
    pub(crate) fn resolve_interaction_maps(&mut self) {
        for stage in &self.stages {
            let slot = match stage.blend {
                StageBlend::Diffuse => &mut self.diffuse,
                StageBlend::Bump => &mut self.bump,
                StageBlend::Specular => &mut self.specular,
                StageBlend::Other(_) => continue,
            };
            if slot.is_none() {
                slot.clone_from(&stage.map);
            }
        }
    }
}
