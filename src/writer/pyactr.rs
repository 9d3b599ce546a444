//! Python writer for the pyactr package.
//!
//! The model becomes a script building an `ACTRModel` instance;
//! productions are `productionstring` calls in pyactr's production
//! language.

use crate::issues::{Location, Log};
use crate::model::{
    Compare, Model, Pattern, PatternValue, Statement, Value, options::LogLevel,
};

use super::{
    CodeWriter, EmitMatch, GENERATOR_VERSION, Info, ParsedInitialBuffers, float_str,
    merge_matches,
};

pub const INFO: Info = Info {
    name: "pyactr",
    language: "python",
    file_extension: "py",
    executable_name: "python3",
    python_required_packages: &["pyactr"],
};

const PRINT_FILE_NAME: &str = "pyactr_print.py";
const PRINT_IMPORT_NAME: &str = "pyactr_print";
const PRINT_SOURCE: &str = include_str!("support/pyactr_print.py");

pub fn validate_model(model: &Model) -> Log {
    let mut log = Log::new();

    if model.memory().finst_time.is_some() {
        log.warning(None, "pyactr does not support memory module's finst_time");
    }

    for production in &model.productions {
        let mut print_statements = 0;

        for statement in &production.do_statements {
            match statement {
                Statement::Print { .. } => {
                    print_statements += 1;
                    if print_statements > 1 {
                        log.warning(
                            Some(Location::line_only(production.line)),
                            format!(
                                "pyactr only supports one print statement per production \
                                 (in \"{}\")",
                                production.name
                            ),
                        );
                    }
                }

                Statement::Recall { request_params, .. } => {
                    for (param, value) in request_params {
                        if param == "recently_retrieved" {
                            if value != "nil" {
                                log.warning(
                                    Some(Location::line_only(production.line)),
                                    format!(
                                        "pyactr only supports 'recently_retrieved nil' \
                                         (in \"{}\")",
                                        production.name
                                    ),
                                );
                            }
                        } else {
                            log.warning(
                                Some(Location::line_only(production.line)),
                                format!(
                                    "pyactr only supports the 'recently_retrieved' \
                                     request parameter (in \"{}\")",
                                    production.name
                                ),
                            );
                        }
                    }
                }

                _ => {}
            }
        }
    }

    log
}

pub fn support_files(model: &Model) -> Vec<(&'static str, &'static str)> {
    if model.has_print_statement() {
        vec![(PRINT_FILE_NAME, PRINT_SOURCE)]
    } else {
        Vec::new()
    }
}

pub fn emit(model: &Model, initial_buffers: &ParsedInitialBuffers) -> String {
    let mut w = CodeWriter::new();
    let model_name = format!("pyactr_{}", model.name);
    let goal_override = initial_buffers.get("goal");
    let options = &model.options;
    let memory = model.memory();

    write_header(&mut w, model);
    write_imports(&mut w, model);
    w.blank();

    if let Some(seed) = options.random_seed {
        w.line(format!("numpy.random.seed({seed})"));
        w.blank();
    }

    w.line(format!("{model_name} = actr.ACTRModel("));
    // subsymbolic computations are always on
    w.line("    subsymbolic=True,");
    if let Some(latency) = memory.latency_factor {
        w.line(format!("    latency_factor={},", float_str(latency)));
    }
    if let Some(exponent) = memory.latency_exponent {
        w.line(format!("    latency_exponent={},", float_str(exponent)));
    }
    if let Some(threshold) = memory.retrieval_threshold {
        w.line(format!("    retrieval_threshold={},", float_str(threshold)));
    }
    if let Some(decay) = memory.decay {
        w.line(format!("    decay={},", float_str(decay)));
    }
    if let Some(strength) = memory.max_spread_strength {
        w.line(format!("    strength_of_association={},", float_str(strength)));
        if let Some(weight) = model.goal().spreading_activation {
            // pyactr names the goal buffer 'g' here
            w.line(format!(
                "    buffer_spreading_activation={{'g': {}}},",
                float_str(weight)
            ));
        }
    }
    if let Some(noise) = memory.instantaneous_noise {
        w.line(format!("    instantaneous_noise={},", float_str(noise)));
    }
    if let Some(penalty) = memory.mismatch_penalty {
        w.line(format!(
            "    partial_matching=True, mismatch_penalty={},",
            float_str(penalty)
        ));
    }
    if let Some(time) = model.procedural().default_action_time {
        w.line(format!("    rule_firing={},", float_str(time)));
    }
    if options.trace_activations {
        w.line("    activation_trace=True,");
    }
    w.line(")");

    if model.has_print_statement() {
        w.blank();
        w.line("# pyactr has no general printing; gactar patches it in");
        w.line(format!("{PRINT_IMPORT_NAME}.set_model({model_name})"));
    }
    w.blank();

    // chunk types
    for chunk in &model.chunks {
        if chunk.is_internal() {
            continue;
        }
        w.line(format!("# amod line {}", chunk.line));
        w.line(format!(
            "actr.chunktype('{}', '{}')",
            chunk.name,
            chunk.slot_names.join(", ")
        ));
    }
    w.blank();

    // modules & buffers
    w.line(format!("memory = {model_name}.decmem"));
    if let Some(size) = memory.finst_size {
        w.line(format!("{model_name}.retrieval.finst = {size}"));
    } else {
        // finst defaults to 0 in pyactr; 4 is the ACT-R default
        w.line(format!("{model_name}.retrieval.finst = 4"));
    }

    w.line(format!("goal = {model_name}.set_goal('goal')"));

    if let Some(imaginal) = model.imaginal() {
        let mut line = format!("imaginal = {model_name}.set_goal(name=\"imaginal\"");
        if let Some(delay) = imaginal.delay {
            line.push_str(&format!(", delay={}", float_str(delay)));
        }
        line.push(')');
        w.line(line);
    }

    if let Some(extra) = model.extra_buffers() {
        w.blank();
        w.line("# define a goal-style buffer for each extra buffer");
        for buffer in &extra.buffers {
            w.line(format!(
                "{name} = {model_name}.set_goal('{name}')",
                name = buffer.name
            ));
        }
    }
    w.blank();

    write_initializers(&mut w, model, goal_override);
    write_similarities(&mut w, model, &model_name);

    if let Some(goal) = goal_override {
        w.line("goal.add(actr.chunkstring(string='''");
        write_pattern(&mut w, model, goal, 1);
        w.line("'''))");
        w.blank();
    }

    write_productions(&mut w, model, &model_name);

    w.blank();
    write_main(&mut w, &model_name, options.log_level);

    w.into_string()
}

fn write_header(w: &mut CodeWriter, model: &Model) {
    w.line(format!("# Generated by gactar {GENERATOR_VERSION}"));
    w.line("#");
    w.line("# *** NOTE: This is a generated file. Any changes may be overwritten.");
    w.blank();

    if let Some(description) = &model.description {
        w.line(format!("# {description}"));
        w.blank();
    }

    if !model.authors.is_empty() {
        w.line("# Authors:");
        for author in &model.authors {
            w.line(format!("#     {author}"));
        }
        w.blank();
    }
}

fn write_imports(w: &mut CodeWriter, model: &Model) {
    if model.options.random_seed.is_some() {
        w.line("import numpy");
    }

    w.line("import pyactr as actr");

    if model.has_print_statement() {
        w.line(format!("import {PRINT_IMPORT_NAME}"));
    }
}

fn write_initializers(w: &mut CodeWriter, model: &Model, goal_override: Option<&Pattern>) {
    for init in &model.initializers {
        // a user-supplied goal replaces the model's goal initializer
        if init.module_name == "goal" && goal_override.is_some() {
            continue;
        }

        w.line(format!("# amod line {}", init.line));

        // extra buffers are addressed by buffer name, built-ins by module
        let target = if init.module_name == "extra_buffers" {
            &init.buffer_name
        } else {
            &init.module_name
        };

        let mut line = format!("{target}.add(actr.chunkstring(");
        if let Some(name) = &init.chunk_name {
            line.push_str(&format!("name='{name}', "));
        }
        line.push_str("string='''");
        w.line(line);
        write_pattern(w, model, &init.pattern, 1);
        w.line("'''))");
    }

    w.blank();
}

fn write_similarities(w: &mut CodeWriter, model: &Model, model_name: &str) {
    if model.similarities.is_empty() {
        return;
    }

    for similar in &model.similarities {
        w.line(format!("# amod line {}", similar.line));
        w.line(format!(
            "{model_name}.set_similarities('{}', '{}', {})",
            similar.chunk_one,
            similar.chunk_two,
            float_str(similar.value)
        ));
    }

    w.blank();
}

fn write_productions(w: &mut CodeWriter, model: &Model, model_name: &str) {
    for production in &model.productions {
        if let Some(description) = &production.description {
            w.line(format!("# {description}"));
        }
        w.line(format!("# amod line {}", production.line));

        w.line(format!(
            "{model_name}.productionstring(name='{}', string='''",
            production.name
        ));

        for m in merge_matches(production) {
            match m {
                EmitMatch::Pattern { buffer, pattern } => {
                    w.line(format!("     ={buffer}>"));
                    write_pattern(w, model, pattern, 2);
                }
                EmitMatch::Query { buffer, checks } => {
                    w.line(format!("     ?{buffer}>"));
                    for (key, value) in checks {
                        w.line(format!("        {key} {value}"));
                    }
                }
            }
        }

        w.line("     ==>");

        for statement in &production.do_statements {
            write_statement(w, model, production, statement);
        }

        w.line("''')");
        w.blank();
    }
}

fn write_main(w: &mut CodeWriter, model_name: &str, log_level: LogLevel) {
    w.line("# Main");
    w.line("if __name__ == '__main__':");

    let mut options = vec!["gui=False"];
    if log_level == LogLevel::Min {
        options.push("trace=False");
    }

    w.line(format!(
        "    sim = {model_name}.simulation( {} )",
        options.join(", ")
    ));
    w.line("    sim.run()");

    if log_level != LogLevel::Min {
        w.line("    if goal.test_buffer('full'):");
        w.line("        print('chunk left in goal: ' + str(goal.pop()))");
        w.line(format!("    if {model_name}.retrieval.test_buffer('full'):"));
        w.line(format!(
            "        print('chunk left in retrieval: ' + str({model_name}.retrieval.pop()))"
        ));
    }
}

/// Write a pattern as chunkstring lines: `isa` plus one `slot value` line
/// per non-wildcard slot.
fn write_pattern(w: &mut CodeWriter, model: &Model, pattern: &Pattern, tabs: usize) {
    let indent = "    ".repeat(tabs + 1);
    let chunk = model
        .lookup_chunk(&pattern.chunk_name)
        .expect("patterns are validated");

    w.line(format!("{indent}isa {}", pattern.chunk_name));

    for (index, slot) in pattern.slots.iter().enumerate() {
        // wildcards are simply omitted
        if matches!(slot.value, PatternValue::Wildcard) {
            continue;
        }

        let slot_name = &chunk.slot_names[index];
        let mut value = String::new();
        if slot.negated {
            value.push('~');
        }
        value.push_str(&slot_value(&slot.value));

        w.line(format!("{indent}{slot_name} {value}"));

        for constraint in &slot.constraints {
            let mut value = String::new();
            if constraint.compare == Compare::NotEqual {
                value.push('~');
            }
            value.push_str(&constraint_value(&constraint.rhs));
            w.line(format!("{indent}{slot_name} {value}"));
        }
    }
}

fn slot_value(value: &PatternValue) -> String {
    match value {
        PatternValue::Wildcard => String::new(),
        PatternValue::Nil => "None".to_string(),
        PatternValue::Ident(id) => id.clone(),
        PatternValue::Str(s) => format!("\"{s}\""),
        PatternValue::Number(n) => n.clone(),
        PatternValue::Var(name) => format!("={name}"),
    }
}

fn constraint_value(value: &Value) -> String {
    match value {
        Value::Nil => "None".to_string(),
        Value::Var(name) => format!("={name}"),
        Value::Ident(id) => id.clone(),
        Value::Str(s) => format!("\"{s}\""),
        Value::Number(n) => n.clone(),
    }
}

fn write_statement(
    w: &mut CodeWriter,
    model: &Model,
    production: &crate::model::Production,
    statement: &Statement,
) {
    match statement {
        Statement::Set(set) => {
            w.line(format!("     ={}>", set.buffer_name));

            if let Some(pattern) = &set.pattern {
                write_pattern(w, model, pattern, 2);
            } else if let Some(chunk_name) = &set.chunk_name {
                w.line(format!("        isa {chunk_name}"));
                for slot in &set.slots {
                    w.line(format!(
                        "        {} {}",
                        slot.name,
                        set_slot_value(&slot.value)
                    ));
                }
            }
        }

        Statement::Recall {
            pattern,
            request_params,
            ..
        } => {
            // clearing first works around pyactr re-retrieval quirks
            w.line("     ~retrieval>");
            w.line("     +retrieval>");
            write_pattern(w, model, pattern, 2);
            for (param, value) in request_params {
                if param != "recently_retrieved" {
                    continue;
                }
                // adapt to pyactr's terminology
                let value = if value == "nil" { "False" } else { value.as_str() };
                w.line(format!("        {param} {value}"));
            }
        }

        Statement::Print { values } => {
            // the print support file patches in print_text; 'goal' is an
            // arbitrary hook point
            w.line("     !goal>");

            let args: Vec<String> = values
                .iter()
                .map(|value| match value {
                    Value::Var(name) => {
                        let var_index = production
                            .var_indexes
                            .get(name)
                            .expect("print variables are validated");
                        format!("{}.{}", var_index.buffer_name, var_index.slot_name)
                    }
                    Value::Str(s) => format!("'{s}'"),
                    Value::Number(n) => n.clone(),
                    // IDs and nil are rejected during validation
                    Value::Ident(id) => format!("'{id}'"),
                    Value::Nil => "None".to_string(),
                })
                .collect();

            w.line(format!("          print_text \"{}\"", args.join(", ")));
        }

        Statement::Clear { buffer_names } => {
            for name in buffer_names {
                w.line(format!("     ~{name}>"));
            }
        }

        Statement::Stop => {
            // pyactr stops when the goal is cleared
            w.line("     ~goal>");
        }
    }
}

fn set_slot_value(value: &Value) -> String {
    match value {
        Value::Nil => "None".to_string(),
        Value::Var(name) => format!("={name}"),
        Value::Ident(id) => id.clone(),
        Value::Str(s) => format!("\"{s}\""),
        Value::Number(n) => n.clone(),
    }
}
