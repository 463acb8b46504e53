//! Per-light interaction pass: diffuse, bump and specular maps.

use crate::arb_program::ArbProgram;
use crate::glsl_program::GlslProgram;
use gl::types::GLuint;
use std::path::Path;

pub const NAME: &str = "bumpMap";

pub const ATTR_TEXCOORD: GLuint = 8;
pub const ATTR_TANGENT: GLuint = 9;
pub const ATTR_BITANGENT: GLuint = 10;

pub fn arb_bump_program(program_dir: &Path) -> ArbProgram {
    ArbProgram::new(NAME, program_dir, "interaction_vp.glp", "interaction_fp.glp")
}

/// The ARB variant reads tangent space from fixed attribute slots; the GLSL one
/// has to be told where they are before linking.
pub fn glsl_bump_program(program_dir: &Path) -> GlslProgram {
    GlslProgram::new(
        NAME,
        program_dir,
        "interaction_vp.glsl",
        "interaction_fp.glsl",
    )
    .with_attributes(&[
        (ATTR_TEXCOORD, "attr_TexCoord0"),
        (ATTR_TANGENT, "attr_Tangent"),
        (ATTR_BITANGENT, "attr_Binormal"),
    ])
}
