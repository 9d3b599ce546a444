//! Built-in ACT-R modules and their buffers.
//!
//! A module groups zero or more buffers with the parameters controlling the
//! runtime's behavior over them. The set is closed, so a tagged enum with a
//! small shared interface covers it; the writers specialize on the tag.

use super::params::{self, ParamSpec};

/// A named container holding at most one chunk instance at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Buffer {
    pub name: String,
    /// Whether the owning module accepts more than one initializer for
    /// this buffer (declarative memory does, goal-style buffers do not).
    pub multiple_init: bool,
}

impl Buffer {
    fn single(name: &str) -> Self {
        Self {
            name: name.to_string(),
            multiple_init: false,
        }
    }
}

/// Declarative memory. Always present; owns the `retrieval` buffer.
#[derive(Debug, Default)]
pub struct DeclarativeMemory {
    pub buffer: Buffer,

    pub latency_factor: Option<f64>,
    pub latency_exponent: Option<f64>,
    pub retrieval_threshold: Option<f64>,
    pub finst_size: Option<i64>,
    pub finst_time: Option<f64>,
    /// Enables base-level learning.
    pub decay: Option<f64>,
    /// Presence turns on the spreading-activation calculation.
    pub max_spread_strength: Option<f64>,
    pub instantaneous_noise: Option<f64>,
    /// Presence turns on partial matching (and with it, similarities).
    pub mismatch_penalty: Option<f64>,
}

impl DeclarativeMemory {
    pub fn is_using_base_level_learning(&self) -> bool {
        self.decay.is_some()
    }

    pub fn is_using_spreading_activation(&self) -> bool {
        self.max_spread_strength.is_some()
    }
}

/// The `goal` buffer's module. Always present.
#[derive(Debug, Default)]
pub struct Goal {
    pub buffer: Buffer,
    pub spreading_activation: Option<f64>,
}

/// The production system. Always present; has no buffer.
#[derive(Debug, Default)]
pub struct Procedural {
    pub default_action_time: Option<f64>,
}

/// The optional `imaginal` buffer's module.
#[derive(Debug, Default)]
pub struct Imaginal {
    pub buffer: Buffer,
    pub delay: Option<f64>,
}

/// User-declared additional goal-style buffers.
#[derive(Debug, Default)]
pub struct ExtraBuffers {
    pub buffers: Vec<Buffer>,
}

#[derive(Debug)]
pub enum Module {
    Memory(DeclarativeMemory),
    Goal(Goal),
    Procedural(Procedural),
    Imaginal(Imaginal),
    ExtraBuffers(ExtraBuffers),
}

impl Module {
    pub fn new_memory() -> Self {
        Module::Memory(DeclarativeMemory {
            buffer: Buffer {
                name: "retrieval".to_string(),
                multiple_init: true,
            },
            ..Default::default()
        })
    }

    pub fn new_goal() -> Self {
        Module::Goal(Goal {
            buffer: Buffer::single("goal"),
            ..Default::default()
        })
    }

    pub fn new_procedural() -> Self {
        Module::Procedural(Procedural::default())
    }

    pub fn new_imaginal() -> Self {
        Module::Imaginal(Imaginal {
            buffer: Buffer::single("imaginal"),
            ..Default::default()
        })
    }

    pub fn new_extra_buffers() -> Self {
        Module::ExtraBuffers(ExtraBuffers::default())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Module::Memory(_) => "memory",
            Module::Goal(_) => "goal",
            Module::Procedural(_) => "procedural",
            Module::Imaginal(_) => "imaginal",
            Module::ExtraBuffers(_) => "extra_buffers",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Module::Memory(_) => "declarative memory",
            Module::Goal(_) => "provides the goal buffer",
            Module::Procedural(_) => "the production system",
            Module::Imaginal(_) => "provides the imaginal buffer",
            Module::ExtraBuffers(_) => "allows declaration of extra goal-style buffers",
        }
    }

    pub fn buffers(&self) -> &[Buffer] {
        match self {
            Module::Memory(m) => std::slice::from_ref(&m.buffer),
            Module::Goal(g) => std::slice::from_ref(&g.buffer),
            Module::Procedural(_) => &[],
            Module::Imaginal(i) => std::slice::from_ref(&i.buffer),
            Module::ExtraBuffers(eb) => &eb.buffers,
        }
    }

    pub fn has_buffers(&self) -> bool {
        !self.buffers().is_empty()
    }

    pub fn allows_multiple_init(&self) -> bool {
        self.buffers().first().is_some_and(|b| b.multiple_init)
    }

    /// The declarative parameter schema this module validates its config
    /// against. `extra_buffers` is dynamic: every key declares a buffer.
    pub fn param_schema(&self) -> &'static [ParamSpec] {
        match self {
            Module::Memory(_) => params::MEMORY_PARAMS,
            Module::Goal(_) => params::GOAL_PARAMS,
            Module::Procedural(_) => params::PROCEDURAL_PARAMS,
            Module::Imaginal(_) => params::IMAGINAL_PARAMS,
            Module::ExtraBuffers(_) => &[],
        }
    }
}
