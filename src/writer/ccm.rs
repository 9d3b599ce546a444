//! Python writer for CCM's python_actr package.
//!
//! The model becomes a Python class: buffers are class-level attributes,
//! productions are methods whose keyword arguments are the match
//! conditions.

use crate::issues::{Location, Log};
use crate::model::{
    Compare, Model, Pattern, PatternSlot, PatternValue, Statement, Value,
    options::LogLevel,
};

use super::{CodeWriter, GENERATOR_VERSION, Info, ParsedInitialBuffers, float_str};

pub const INFO: Info = Info {
    name: "ccm",
    language: "python",
    file_extension: "py",
    executable_name: "python3",
    python_required_packages: &["python_actr"],
};

const ACTIVATE_TRACE_FILE_NAME: &str = "gactar_ccm_activate_trace.py";
const ACTIVATE_TRACE_IMPORT_NAME: &str = "gactar_ccm_activate_trace";
const ACTIVATE_TRACE_SOURCE: &str = include_str!("support/gactar_ccm_activate_trace.py");

pub fn validate_model(model: &Model) -> Log {
    let mut log = Log::new();

    if model.memory().latency_exponent.is_some() {
        log.warning(None, "ccm does not support memory module's latency_exponent");
    }

    for production in &model.productions {
        for statement in &production.do_statements {
            if let Statement::Recall { request_params, .. } = statement {
                if !request_params.is_empty() {
                    let keys: Vec<&str> =
                        request_params.iter().map(|(k, _)| k.as_str()).collect();
                    log.warning(
                        Some(Location::line_only(production.line)),
                        format!(
                            "ccm does not support request parameters (\"{}\" in \"{}\")",
                            keys.join(", "),
                            production.name
                        ),
                    );
                }
            }
        }
    }

    log
}

pub fn support_files(model: &Model) -> Vec<(&'static str, &'static str)> {
    if model.options.trace_activations {
        vec![(ACTIVATE_TRACE_FILE_NAME, ACTIVATE_TRACE_SOURCE)]
    } else {
        Vec::new()
    }
}

pub fn emit(model: &Model, initial_buffers: &ParsedInitialBuffers) -> String {
    let mut w = CodeWriter::new();
    let class_name = format!("ccm_{}", model.name);
    let goal_override = initial_buffers.get("goal");
    let options = &model.options;
    let memory = model.memory();

    write_header(&mut w, model);
    write_imports(&mut w, model);
    w.blank();
    w.blank();

    if let Some(seed) = options.random_seed {
        w.line(format!("random.seed({seed})"));
        w.blank();
        w.blank();
    }

    w.line(format!("class {class_name}(ACTR):"));

    for buffer in model.buffer_names() {
        w.line(format!("    {buffer} = Buffer()"));
    }
    w.blank();

    let mut memory_args = vec![memory.buffer.name.clone()];
    if let Some(latency) = memory.latency_factor {
        memory_args.push(format!("latency={}", float_str(latency)));
    }
    if let Some(threshold) = memory.retrieval_threshold {
        memory_args.push(format!("threshold={}", float_str(threshold)));
    }
    if let Some(size) = memory.finst_size {
        memory_args.push(format!("finst_size={size}"));
    }
    if let Some(time) = memory.finst_time {
        memory_args.push(format!("finst_time={}", float_str(time)));
    }
    w.line(format!("    memory = Memory({})", memory_args.join(", ")));

    if options.trace_activations {
        w.line("    trace = ActivateTrace(memory)");
    }
    w.blank();

    if let Some(decay) = memory.decay {
        w.line(format!("    DMBaseLevel(memory, decay={})", float_str(decay)));
        w.blank();
    }

    if let Some(strength) = memory.max_spread_strength {
        w.line(format!(
            "    spread = DMSpreading(memory, {})",
            model.buffer_names().join(", ")
        ));
        w.line(format!("    spread.strength = {}", float_str(strength)));
        if let Some(weight) = model.goal().spreading_activation {
            w.line(format!("    spread.weight[goal] = {}", float_str(weight)));
        }
        w.blank();
    }

    if let Some(noise) = memory.instantaneous_noise {
        w.line(format!("    DMNoise(memory, noise={})", float_str(noise)));
        w.blank();
    }

    if let Some(penalty) = memory.mismatch_penalty {
        w.line(format!("    partial = Partial(memory, limit={})", float_str(penalty)));
        for similar in &model.similarities {
            w.line(format!("    # amod line {}", similar.line));
            w.line(format!(
                "    partial.similarity('{}', '{}', {})",
                similar.chunk_one,
                similar.chunk_two,
                float_str(similar.value)
            ));
        }
        w.blank();
    }

    if let Some(time) = model.procedural().default_action_time {
        w.line(format!("    production_time = {}", float_str(time)));
        w.blank();
    }

    if options.log_level == LogLevel::Info {
        // turns on the base class's high-level logging
        w.line("    def __init__(self):");
        w.line("        super().__init__(log=True)");
        w.blank();
    }

    write_initializers(&mut w, model, goal_override);

    write_productions(&mut w, model);

    w.blank();
    write_main(&mut w, &class_name, options.log_level);

    w.into_string()
}

fn write_header(w: &mut CodeWriter, model: &Model) {
    w.line("\"\"\"");

    if let Some(description) = &model.description {
        w.line(description);
        w.blank();
    }

    if !model.authors.is_empty() {
        w.line("Authors:");
        for author in &model.authors {
            w.line(format!("   {author}"));
        }
        w.blank();
    }

    w.line(format!("Generated by gactar {GENERATOR_VERSION}"));
    w.blank();
    w.line("NOTE: This is a generated file. Any changes may be overwritten.");
    w.line("\"\"\"");
    w.blank();
}

fn write_imports(w: &mut CodeWriter, model: &Model) {
    let memory = model.memory();
    let options = &model.options;

    if options.random_seed.is_some() {
        w.line("import random");
    }

    w.line("from python_actr import ACTR, Buffer, Memory");

    let mut additional = Vec::new();
    if memory.is_using_base_level_learning() {
        additional.push("DMBaseLevel");
    }
    if memory.is_using_spreading_activation() {
        additional.push("DMSpreading");
    }
    if memory.instantaneous_noise.is_some() {
        additional.push("DMNoise");
    }
    if memory.mismatch_penalty.is_some() {
        additional.push("Partial");
    }
    if !additional.is_empty() {
        w.line(format!("from python_actr import {}", additional.join(", ")));
    }

    if options.log_level == LogLevel::Detail {
        w.line("from python_actr import log, log_everything");
    }

    if options.trace_activations {
        w.blank();
        w.line(format!(
            "from {ACTIVATE_TRACE_IMPORT_NAME} import ActivateTrace"
        ));
    }
}

fn write_initializers(w: &mut CodeWriter, model: &Model, goal_override: Option<&Pattern>) {
    if model.initializers.is_empty() && goal_override.is_none() {
        return;
    }

    w.line("    def init():");

    for init in &model.initializers {
        // a user-supplied goal replaces the model's goal initializer
        if init.module_name == "goal" && goal_override.is_some() {
            continue;
        }

        let mut comment = format!("        # amod line {}", init.line);
        if let Some(name) = &init.chunk_name {
            comment.push_str(&format!(" \"{name}\""));
        }
        w.line(comment);

        let module = model
            .lookup_module(&init.module_name)
            .expect("initializer module exists");
        if module.allows_multiple_init() {
            w.line(format!(
                "        {}.add({})",
                init.module_name,
                pattern_string(&init.pattern)
            ));
        } else {
            w.line(format!(
                "        {}.set({})",
                init.buffer_name,
                pattern_string(&init.pattern)
            ));
        }
    }

    if let Some(goal) = goal_override {
        w.blank();
        w.line(format!("        goal.set({})", pattern_string(goal)));
    }

    w.blank();
}

fn write_productions(w: &mut CodeWriter, model: &Model) {
    for production in &model.productions {
        if let Some(description) = &production.description {
            w.line(format!("    # {description}"));
        }
        w.line(format!("    # amod line {}", production.line));

        let mut conditions = Vec::new();
        for m in &production.matches {
            match m {
                crate::model::Match::BufferPattern {
                    buffer_name,
                    pattern,
                } => {
                    conditions.push(format!("{buffer_name}={}", pattern_string(pattern)));
                }
                crate::model::Match::BufferState { buffer_name, state } => {
                    conditions.push(format!("{buffer_name}='{state}:True'"));
                }
                crate::model::Match::ModuleState {
                    module_name, state, ..
                } => {
                    conditions.push(format!("{module_name}='{state}:True'"));
                }
            }
        }

        w.line(format!(
            "    def {}({}):",
            production.name,
            conditions.join(", ")
        ));

        for statement in &production.do_statements {
            write_statement(w, statement);
        }

        w.blank();
    }
}

fn write_statement(w: &mut CodeWriter, statement: &Statement) {
    match statement {
        Statement::Set(set) => {
            if let Some(pattern) = &set.pattern {
                w.line(format!(
                    "        {}.set({})",
                    set.buffer_name,
                    pattern_string(pattern)
                ));
            } else {
                let assignments: Vec<String> = set
                    .slots
                    .iter()
                    .map(|slot| format!("_{}={}", slot.index, convert_value(&slot.value)))
                    .collect();
                w.line(format!(
                    "        {}.modify({})",
                    set.buffer_name,
                    assignments.join(", ")
                ));
            }
        }

        Statement::Recall { pattern, .. } => {
            w.line(format!("        memory.request({})", pattern_string(pattern)));
        }

        Statement::Clear { buffer_names } => {
            for name in buffer_names {
                w.line(format!("        {name}.clear()"));
            }
        }

        Statement::Print { values } => {
            if values.is_empty() {
                w.line("        print()");
            } else {
                let args: Vec<String> = values.iter().map(print_value).collect();
                w.line(format!("        print({}, sep='')", args.join(", ")));
            }
        }

        Statement::Stop => {
            w.line("        self.stop()");
        }
    }
}

fn write_main(w: &mut CodeWriter, class_name: &str, log_level: LogLevel) {
    w.line("if __name__ == \"__main__\":");
    w.line(format!("    model = {class_name}()"));
    if log_level == LogLevel::Detail {
        w.line("    log(summary=1)");
        w.line("    log_everything(model)");
    }
    w.line("    model.run()");
}

/// Serialize a pattern as a python_actr string literal:
/// `'chunkName slot1 slot2 ...'`.
fn pattern_string(pattern: &Pattern) -> String {
    let mut out = format!("'{}", pattern.chunk_name);
    for slot in &pattern.slots {
        out.push(' ');
        out.push_str(&slot_string(slot));
    }
    out.push('\'');
    out
}

fn slot_string(slot: &PatternSlot) -> String {
    let mut out = String::new();

    if slot.negated {
        out.push('!');
    }

    match &slot.value {
        PatternValue::Wildcard => out.push('?'),
        PatternValue::Nil => out.push_str("None"),
        PatternValue::Ident(id) => out.push_str(id),
        PatternValue::Str(s) => out.push_str(&s.replace(' ', "_")),
        PatternValue::Number(n) => out.push_str(n),
        PatternValue::Var(name) => {
            out.push('?');
            out.push_str(name);
        }
    }

    for constraint in &slot.constraints {
        if constraint.compare == Compare::NotEqual {
            out.push('!');
        }
        out.push_str(&constraint_value(&constraint.rhs));
    }

    out
}

/// Constraint values live inside the pattern string literal, so they are
/// written in slot syntax, never quoted.
fn constraint_value(value: &Value) -> String {
    match value {
        Value::Nil => "None".to_string(),
        Value::Var(name) => format!("?{name}"),
        Value::Ident(id) => id.clone(),
        Value::Str(s) => s.replace(' ', "_"),
        Value::Number(n) => n.clone(),
    }
}

fn convert_value(value: &Value) -> String {
    match value {
        Value::Nil => "None".to_string(),
        Value::Var(name) => name.clone(),
        Value::Ident(id) => format!("'{id}'"),
        Value::Str(s) => format!("'{}'", s.replace(' ', "_")),
        Value::Number(n) => n.clone(),
    }
}

fn print_value(value: &Value) -> String {
    match value {
        Value::Var(name) => name.clone(),
        Value::Str(s) => format!("'{s}'"),
        Value::Number(n) => n.clone(),
        // IDs and nil are rejected during validation
        Value::Ident(id) => format!("'{id}'"),
        Value::Nil => "None".to_string(),
    }
}
