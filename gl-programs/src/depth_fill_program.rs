//! The depth-only pass that fills the z-buffer before lighting.

use crate::arb_program::ArbProgram;
use crate::glsl_program::GlslProgram;
use std::path::Path;

pub const NAME: &str = "depthFill";

pub fn arb_depth_fill_program(program_dir: &Path) -> ArbProgram {
    ArbProgram::new(NAME, program_dir, "zfill_vp.glp", "zfill_fp.glp")
}

pub fn glsl_depth_fill_program(program_dir: &Path) -> GlslProgram {
    GlslProgram::new(NAME, program_dir, "zfill_vp.glsl", "zfill_fp.glsl")
}
