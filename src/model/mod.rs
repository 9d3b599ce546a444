//! Language-neutral model representation.
//!
//! This is what the builder produces from a parsed amod file and what the
//! writers consume. After the builder pass the model is immutable; writers
//! hold only shared references. Productions refer to buffers and modules by
//! name, never by ownership, so there are no cycles to manage.

pub mod modules;
pub mod options;
pub mod params;

use modules::Module;
use options::Options;

/// The chunk type used internally for buffer/module status matches.
pub const INTERNAL_STATUS_CHUNK: &str = "_status";

/// A named slot schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub name: String,
    pub slot_names: Vec<String>,
    /// Line in the amod file of the declaration (0 for internal chunks).
    pub line: usize,
}

impl Chunk {
    pub fn is_internal(&self) -> bool {
        self.name.starts_with('_')
    }

    pub fn num_slots(&self) -> usize {
        self.slot_names.len()
    }

    pub fn has_slot(&self, slot: &str) -> bool {
        self.slot_names.iter().any(|s| s == slot)
    }

    /// 1-based index of the slot, or None if the chunk has no such slot.
    pub fn slot_index(&self, slot: &str) -> Option<usize> {
        self.slot_names.iter().position(|s| s == slot).map(|i| i + 1)
    }
}

/// The structural literal used in initializers, matches, and actions.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub chunk_name: String,
    pub slots: Vec<PatternSlot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternSlot {
    pub negated: bool,
    pub value: PatternValue,
    /// Where-clause constraints; only ever present on variables.
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternValue {
    Wildcard,
    Nil,
    Ident(String),
    Str(String),
    /// Kept as source text; no framework needs the numeric value.
    Number(String),
    /// Variable name without the leading `?`.
    Var(String),
}

impl PatternSlot {
    pub fn var_name(&self) -> Option<&str> {
        match &self.value {
            PatternValue::Var(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compare {
    Equal,
    NotEqual,
}

/// One where-clause comparison attached to a pattern variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub compare: Compare,
    pub rhs: Value,
}

/// A scalar value in a statement or constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    /// Variable name without the leading `?`.
    Var(String),
    Ident(String),
    Str(String),
    Number(String),
}

/// Places an initial chunk into a buffer or declarative memory.
#[derive(Debug, Clone)]
pub struct Initializer {
    pub module_name: String,
    pub buffer_name: String,
    /// Explicit chunk name, e.g. `memory foo [author: ...]`.
    pub chunk_name: Option<String>,
    pub pattern: Pattern,
    pub line: usize,
}

/// Closeness of two chunk names, used by activation calculations.
#[derive(Debug, Clone)]
pub struct Similarity {
    pub chunk_one: String,
    pub chunk_two: String,
    pub value: f64,
    pub line: usize,
}

/// Where a match variable was first bound.
#[derive(Debug, Clone, PartialEq)]
pub struct VarIndex {
    pub buffer_name: String,
    pub slot_name: String,
}

#[derive(Debug, Clone)]
pub enum Match {
    BufferPattern {
        buffer_name: String,
        pattern: Pattern,
    },
    /// `buffer is empty|full`
    BufferState {
        buffer_name: String,
        state: String,
    },
    /// `module [_status: busy|error]`
    ModuleState {
        module_name: String,
        /// The buffer the generated code addresses the check to.
        buffer_name: String,
        state: String,
    },
}

#[derive(Debug, Clone)]
pub enum Statement {
    Clear {
        buffer_names: Vec<String>,
    },
    Print {
        values: Vec<Value>,
    },
    Recall {
        pattern: Pattern,
        memory_module_name: String,
        /// Request parameters from `with (...)`, in source order.
        request_params: Vec<(String, String)>,
    },
    Set(SetStatement),
    Stop,
}

/// Sets one or more slots of a matched buffer, or replaces its contents
/// with a pattern. Consecutive slot sets on the same buffer are merged.
#[derive(Debug, Clone)]
pub struct SetStatement {
    pub buffer_name: String,
    /// Chunk type matched into the buffer; set for the slot form.
    pub chunk_name: Option<String>,
    pub slots: Vec<SetSlot>,
    pub pattern: Option<Pattern>,
}

#[derive(Debug, Clone)]
pub struct SetSlot {
    pub name: String,
    /// 1-based slot position in the chunk type.
    pub index: usize,
    pub value: Value,
}

#[derive(Debug, Clone)]
pub struct Production {
    pub name: String,
    pub description: Option<String>,
    pub matches: Vec<Match>,
    pub do_statements: Vec<Statement>,
    /// Variable name -> first binding site, sorted by name.
    pub var_indexes: std::collections::BTreeMap<String, VarIndex>,
    pub line: usize,
}

impl Production {
    pub fn lookup_match_by_buffer(&self, buffer_name: &str) -> Option<&Pattern> {
        self.matches.iter().find_map(|m| match m {
            Match::BufferPattern {
                buffer_name: name,
                pattern,
            } if name == buffer_name => Some(pattern),
            _ => None,
        })
    }
}

/// A complete ACT-R model: the output of the builder and the input to the
/// writers.
#[derive(Debug)]
pub struct Model {
    pub name: String,
    pub description: Option<String>,
    pub authors: Vec<String>,
    pub examples: Vec<Pattern>,

    pub chunks: Vec<Chunk>,
    pub modules: Vec<Module>,

    /// Chunks named explicitly in initializers; tracked to detect
    /// duplicates and to subtract from the implicit list.
    pub explicit_chunks: Vec<String>,
    /// Identifiers used as slot values which have no declaration. Some
    /// frameworks need these created up front to avoid warnings.
    pub implicit_chunks: Vec<String>,

    pub initializers: Vec<Initializer>,
    pub similarities: Vec<Similarity>,
    pub productions: Vec<Production>,

    pub options: Options,
}

impl Model {
    pub fn new(name: String) -> Self {
        Self {
            name,
            description: None,
            authors: Vec::new(),
            examples: Vec::new(),
            // the internal status chunk is always present
            chunks: vec![Chunk {
                name: INTERNAL_STATUS_CHUNK.to_string(),
                slot_names: vec!["status".to_string()],
                line: 0,
            }],
            modules: vec![
                Module::new_memory(),
                Module::new_goal(),
                Module::new_procedural(),
            ],
            explicit_chunks: Vec::new(),
            implicit_chunks: Vec::new(),
            initializers: Vec::new(),
            similarities: Vec::new(),
            productions: Vec::new(),
            options: Options::default(),
        }
    }

    // ─── lookups ───────────────────────────────────────────────────────

    pub fn lookup_chunk(&self, name: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.name == name)
    }

    pub fn lookup_module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name() == name)
    }

    /// Find the module owning the named buffer.
    pub fn lookup_buffer(&self, buffer_name: &str) -> Option<&Module> {
        self.modules
            .iter()
            .find(|m| m.buffers().iter().any(|b| b.name == buffer_name))
    }

    pub fn has_buffer(&self, buffer_name: &str) -> bool {
        self.lookup_buffer(buffer_name).is_some()
    }

    /// All buffer names in module declaration order.
    pub fn buffer_names(&self) -> Vec<&str> {
        self.modules
            .iter()
            .flat_map(|m| m.buffers().iter().map(|b| b.name.as_str()))
            .collect()
    }

    pub fn memory(&self) -> &modules::DeclarativeMemory {
        for module in &self.modules {
            if let Module::Memory(memory) = module {
                return memory;
            }
        }
        unreachable!("memory module is always present")
    }

    pub fn memory_mut(&mut self) -> &mut modules::DeclarativeMemory {
        for module in &mut self.modules {
            if let Module::Memory(memory) = module {
                return memory;
            }
        }
        unreachable!("memory module is always present")
    }

    pub fn goal(&self) -> &modules::Goal {
        for module in &self.modules {
            if let Module::Goal(goal) = module {
                return goal;
            }
        }
        unreachable!("goal module is always present")
    }

    pub fn goal_mut(&mut self) -> &mut modules::Goal {
        for module in &mut self.modules {
            if let Module::Goal(goal) = module {
                return goal;
            }
        }
        unreachable!("goal module is always present")
    }

    pub fn procedural(&self) -> &modules::Procedural {
        for module in &self.modules {
            if let Module::Procedural(procedural) = module {
                return procedural;
            }
        }
        unreachable!("procedural module is always present")
    }

    pub fn procedural_mut(&mut self) -> &mut modules::Procedural {
        for module in &mut self.modules {
            if let Module::Procedural(procedural) = module {
                return procedural;
            }
        }
        unreachable!("procedural module is always present")
    }

    pub fn imaginal(&self) -> Option<&modules::Imaginal> {
        self.modules.iter().find_map(|m| match m {
            Module::Imaginal(imaginal) => Some(imaginal),
            _ => None,
        })
    }

    pub fn extra_buffers(&self) -> Option<&modules::ExtraBuffers> {
        self.modules.iter().find_map(|m| match m {
            Module::ExtraBuffers(eb) => Some(eb),
            _ => None,
        })
    }

    /// Create the imaginal module if it does not exist and return it.
    pub fn create_imaginal(&mut self) -> &mut modules::Imaginal {
        if !self.modules.iter().any(|m| matches!(m, Module::Imaginal(_))) {
            self.modules.push(Module::new_imaginal());
        }
        for module in &mut self.modules {
            if let Module::Imaginal(imaginal) = module {
                return imaginal;
            }
        }
        unreachable!()
    }

    /// Create the extra_buffers module if it does not exist and return it.
    pub fn create_extra_buffers(&mut self) -> &mut modules::ExtraBuffers {
        if !self
            .modules
            .iter()
            .any(|m| matches!(m, Module::ExtraBuffers(_)))
        {
            self.modules.push(Module::new_extra_buffers());
        }
        for module in &mut self.modules {
            if let Module::ExtraBuffers(eb) = module {
                return eb;
            }
        }
        unreachable!()
    }

    // ─── chunk bookkeeping ─────────────────────────────────────────────

    pub fn add_implicit_chunk(&mut self, chunk_name: impl Into<String>) {
        self.implicit_chunks.push(chunk_name.into());
    }

    /// Record any identifier slot values of the pattern as implicit chunks.
    pub fn add_implicit_chunks_from_pattern(&mut self, pattern: &Pattern) {
        for slot in &pattern.slots {
            if let PatternValue::Ident(id) = &slot.value {
                self.implicit_chunks.push(id.clone());
            }
        }
    }

    pub fn add_initializer(&mut self, initializer: Initializer) {
        if let Some(name) = &initializer.chunk_name {
            self.explicit_chunks.push(name.clone());
        }
        self.add_implicit_chunks_from_pattern(&initializer.pattern);
        self.initializers.push(initializer);
    }

    pub fn add_similarity(&mut self, similarity: Similarity) {
        self.implicit_chunks.push(similarity.chunk_one.clone());
        self.implicit_chunks.push(similarity.chunk_two.clone());
        self.similarities.push(similarity);
    }

    pub fn has_implicit_chunks(&self) -> bool {
        !self.implicit_chunks.is_empty()
    }

    /// Dedupe and sort the implicit chunks, then remove everything already
    /// declared explicitly. Called once after the builder pass.
    pub fn finalize_implicit_chunks(&mut self) {
        self.implicit_chunks.sort();
        self.implicit_chunks.dedup();
        self.implicit_chunks
            .retain(|name| !self.explicit_chunks.contains(name));
    }

    /// An initializer for the named buffer, if the model declares one.
    pub fn lookup_initializer(&self, buffer_name: &str) -> Option<&Initializer> {
        self.initializers
            .iter()
            .find(|init| init.buffer_name == buffer_name)
    }

    /// Whether any production prints; frameworks use this to pull in their
    /// print support.
    pub fn has_print_statement(&self) -> bool {
        self.productions.iter().any(|p| {
            p.do_statements
                .iter()
                .any(|s| matches!(s, Statement::Print { .. }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_model_has_builtins() {
        let model = Model::new("Test".to_string());

        assert!(model.lookup_chunk(INTERNAL_STATUS_CHUNK).is_some());
        assert!(model.lookup_module("memory").is_some());
        assert!(model.lookup_module("goal").is_some());
        assert!(model.lookup_module("procedural").is_some());
        assert!(model.lookup_module("imaginal").is_none());

        assert_eq!(model.buffer_names(), vec!["retrieval", "goal"]);
        assert!(model.has_buffer("retrieval"));
        assert!(!model.has_buffer("imaginal"));
    }

    #[test]
    fn test_chunk_slot_index_is_one_based() {
        let chunk = Chunk {
            name: "count".to_string(),
            slot_names: vec!["first".to_string(), "second".to_string()],
            line: 1,
        };

        assert_eq!(chunk.slot_index("first"), Some(1));
        assert_eq!(chunk.slot_index("second"), Some(2));
        assert_eq!(chunk.slot_index("third"), None);
    }

    #[test]
    fn test_finalize_implicit_chunks() {
        let mut model = Model::new("Test".to_string());

        model.add_implicit_chunk("zebra");
        model.add_implicit_chunk("apple");
        model.add_implicit_chunk("zebra");
        model.add_implicit_chunk("mango");
        model.explicit_chunks.push("mango".to_string());

        model.finalize_implicit_chunks();
        assert_eq!(model.implicit_chunks, vec!["apple", "zebra"]);
    }

    #[test]
    fn test_create_imaginal_is_idempotent() {
        let mut model = Model::new("Test".to_string());
        model.create_imaginal();
        model.create_imaginal();

        let count = model
            .modules
            .iter()
            .filter(|m| matches!(m, Module::Imaginal(_)))
            .count();
        assert_eq!(count, 1);
        assert!(model.has_buffer("imaginal"));
    }
}
