use crate::arb_program::ArbProgram;
use crate::bump_program::{arb_bump_program, glsl_bump_program};
use crate::depth_fill_program::{arb_depth_fill_program, glsl_depth_fill_program};
use crate::errors::ProgramError;
use crate::{bump_program, depth_fill_program, GLProgram, ProgramKind};
use gl_thin::device::GraphicsDevice;
use slotmap::{new_key_type, SlotMap};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

new_key_type! {
    /// Handle to a program built from a vertex/fragment file pair
    pub struct ProgramKey;
}

struct GameProgram {
    program: ArbProgram,
    /// set when creation failed; cleared on the next realise so it gets another try
    failed: bool,
}

/// Owns every GPU program: the fixed built-ins, and programs requested by file pair.
///
/// At most one program exists per key.  Built-ins are created on `realise()`;
/// file-pair programs are created on first request while realised.
pub struct GLProgramFactory {
    program_dir: PathBuf,
    using_glsl: bool,
    realised: bool,
    built_in: BTreeMap<&'static str, Box<dyn GLProgram>>,
    programs: SlotMap<ProgramKey, GameProgram>,
    program_keys: HashMap<(String, String), ProgramKey>,
}

impl GLProgramFactory {
    /// Starts out with the ARB built-ins registered.
    pub fn new(program_dir: impl Into<PathBuf>) -> Self {
        let mut rval = Self {
            program_dir: program_dir.into(),
            using_glsl: false,
            realised: false,
            built_in: BTreeMap::new(),
            programs: SlotMap::with_key(),
            program_keys: HashMap::new(),
        };
        rval.register_built_ins();
        rval
    }

    pub fn program_dir(&self) -> &Path {
        &self.program_dir
    }

    pub fn is_using_glsl(&self) -> bool {
        self.using_glsl
    }

    pub fn is_realised(&self) -> bool {
        self.realised
    }

    fn register_built_ins(&mut self) {
        let dir = self.program_dir.as_path();
        let (depth_fill, bump): (Box<dyn GLProgram>, Box<dyn GLProgram>) = if self.using_glsl {
            (
                Box::new(glsl_depth_fill_program(dir)),
                Box::new(glsl_bump_program(dir)),
            )
        } else {
            (
                Box::new(arb_depth_fill_program(dir)),
                Box::new(arb_bump_program(dir)),
            )
        };
        self.built_in.insert(depth_fill_program::NAME, depth_fill);
        self.built_in.insert(bump_program::NAME, bump);
    }

    /// Choose the GLSL or ARB implementation of every built-in.
    ///
    /// The previous programs are replaced, not kept alongside.  When realised the
    /// replaced programs are destroyed and the new ones created straight away.
    pub fn set_using_glsl(&mut self, use_glsl: bool, device: &mut dyn GraphicsDevice) {
        if self.realised {
            for program in self.built_in.values_mut() {
                program.destroy(device);
            }
        }

        self.using_glsl = use_glsl;
        self.register_built_ins();

        if self.realised {
            self.create_built_ins(device);
        }
    }

    pub fn get_built_in_program(&self, name: &str) -> Result<&dyn GLProgram, ProgramError> {
        self.built_in
            .get(name)
            .map(|program| program.as_ref())
            .ok_or_else(|| ProgramError::Lookup(name.to_string()))
    }

    pub fn built_in_kinds(&self) -> Vec<(&str, ProgramKind)> {
        self.built_in
            .iter()
            .map(|(name, program)| (*name, program.kind()))
            .collect()
    }

    /// Program for the ordered file pair; `(a, b)` and `(b, a)` are different programs.
    ///
    /// A failed build is logged and returned once; the slot stays in the cache
    /// without a usable program, and later requests hand back the same key.
    pub fn get_program(
        &mut self,
        vertex_file: &str,
        fragment_file: &str,
        device: &mut dyn GraphicsDevice,
    ) -> Result<ProgramKey, ProgramError> {
        let pair = (vertex_file.to_string(), fragment_file.to_string());

        let key = match self.program_keys.get(&pair) {
            Some(key) => *key,
            None => {
                let program = ArbProgram::new(
                    format!("{}+{}", vertex_file, fragment_file),
                    &self.program_dir,
                    vertex_file,
                    fragment_file,
                );
                let key = self.programs.insert(GameProgram {
                    program,
                    failed: false,
                });
                self.program_keys.insert(pair, key);
                key
            }
        };

        if self.realised {
            if let Some(entry) = self.programs.get_mut(key) {
                if !entry.failed && !entry.program.is_created() {
                    if let Err(e) = entry.program.create(device) {
                        log::error!("{}", e);
                        entry.failed = true;
                        return Err(e);
                    }
                }
            }
        }

        Ok(key)
    }

    pub fn program(&self, key: ProgramKey) -> Option<&dyn GLProgram> {
        self.programs
            .get(key)
            .map(|entry| &entry.program as &dyn GLProgram)
    }

    /// number of file-pair programs in the cache
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    fn create_built_ins(&mut self, device: &mut dyn GraphicsDevice) {
        for program in self.built_in.values_mut() {
            if let Err(e) = program.create(device) {
                log::error!("{}", e);
            }
        }
    }

    /// Create every built-in.  Call once the GL context is available.
    ///
    /// A built-in that fails to build is logged and left unusable; the factory
    /// is realised regardless.
    pub fn realise(&mut self, device: &mut dyn GraphicsDevice) {
        if self.realised {
            return;
        }
        self.create_built_ins(device);
        for entry in self.programs.values_mut() {
            entry.failed = false;
        }
        self.realised = true;
    }

    /// Destroy every GPU program, built-in or not.  Call before the context goes away.
    pub fn unrealise(&mut self, device: &mut dyn GraphicsDevice) {
        if !self.realised {
            return;
        }
        for program in self.built_in.values_mut() {
            program.destroy(device);
        }
        for entry in self.programs.values_mut() {
            entry.program.destroy(device);
        }
        self.realised = false;
    }
}
