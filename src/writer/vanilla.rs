//! Common Lisp writer for vanilla ACT-R.
//!
//! The model becomes a `(define-model ...)` form loadable by the ACT-R
//! lisp code.

use crate::issues::Log;
use crate::model::{
    Compare, Model, Pattern, PatternValue, Statement, Value, options::LogLevel,
};

use super::{
    CodeWriter, EmitMatch, GENERATOR_VERSION, Info, ParsedInitialBuffers, float_str,
    merge_matches,
};

pub const INFO: Info = Info {
    name: "vanilla",
    language: "commonlisp",
    file_extension: "lisp",
    executable_name: "sbcl",
    python_required_packages: &[],
};

pub fn validate_model(model: &Model) -> Log {
    let mut log = Log::new();

    // chunk-activation tracing needs runtime support missing from some
    // ACT-R distributions (7.21+ is known to work)
    if model.options.trace_activations {
        log.warning(
            None,
            "vanilla ACT-R requires a runtime with :act support for trace_activations",
        );
    }

    log
}

pub fn emit(model: &Model, initial_buffers: &ParsedInitialBuffers) -> String {
    let mut w = CodeWriter::new();
    let model_name = format!("vanilla_{}", model.name);
    let goal_override = initial_buffers.get("goal");

    write_header(&mut w, model);

    w.line("(clear-all)");
    w.blank();

    if let Some(extra) = model.extra_buffers() {
        w.line("(require-compiled \"GOAL-STYLE-MODULE\")");
        w.blank();
        w.line(";; define a goal-style module for each extra buffer");
        for buffer in &extra.buffers {
            w.line(format!(
                "(define-module {name} ({name}) nil
\t:version \"1.0\"
\t:documentation \"Extra buffer: {name}\"
\t:query goal-style-query
\t:request goal-style-request
\t:buffer-mod goal-style-mod-request)",
                name = buffer.name
            ));
            w.blank();
        }
    }

    w.line(format!("(define-model {model_name}"));
    w.blank();

    write_sgp(&mut w, model);

    if let Some(seed) = model.options.random_seed {
        w.line(format!("(sgp :seed ({seed} 0))"));
        w.blank();
    }

    // chunk types
    for chunk in &model.chunks {
        if chunk.is_internal() {
            continue;
        }
        w.line(format!(";; amod line {}", chunk.line));
        w.line(format!(
            "(chunk-type {} {})",
            chunk.name,
            chunk.slot_names.join(" ")
        ));
    }
    w.blank();

    write_initializers(&mut w, model, goal_override);
    write_similarities(&mut w, model);
    write_productions(&mut w, model);

    w.line("(goal-focus goal)");
    w.line(")");

    w.into_string()
}

fn write_header(w: &mut CodeWriter, model: &Model) {
    w.line(format!(";;; Generated by gactar {GENERATOR_VERSION}"));
    w.line(";;;");
    w.line(";;; *** NOTE: This is a generated file. Any changes may be overwritten.");
    w.blank();

    if let Some(description) = &model.description {
        w.line(format!(";;; {description}"));
        w.blank();
    }

    if !model.authors.is_empty() {
        w.line(";;; Authors:");
        for author in &model.authors {
            w.line(format!(";;;\t\t{author}"));
        }
        w.blank();
    }
}

fn write_sgp(w: &mut CodeWriter, model: &Model) {
    let memory = model.memory();
    let options = &model.options;

    w.line("(sgp");
    // subsymbolic computations are always on
    w.line("\t:esc t");

    if let Some(latency) = memory.latency_factor {
        w.line(format!("\t:lf {}", float_str(latency)));
    }
    if let Some(exponent) = memory.latency_exponent {
        w.line(format!("\t:le {}", float_str(exponent)));
    }
    if let Some(threshold) = memory.retrieval_threshold {
        w.line(format!("\t:rt {}", float_str(threshold)));
    }
    if let Some(size) = memory.finst_size {
        w.line(format!("\t:declarative-num-finsts {size}"));
    }
    if let Some(time) = memory.finst_time {
        w.line(format!("\t:declarative-finst-span {}", float_str(time)));
    }
    if let Some(decay) = memory.decay {
        w.line(format!("\t:bll {}", float_str(decay)));
    }
    if let Some(strength) = memory.max_spread_strength {
        w.line(format!("\t:mas {}", float_str(strength)));
        if let Some(activation) = model.goal().spreading_activation {
            w.line(format!("\t:ga {}", float_str(activation)));
        }
    }
    if let Some(noise) = memory.instantaneous_noise {
        w.line(format!("\t:ans {}", float_str(noise)));
    }
    if let Some(penalty) = memory.mismatch_penalty {
        w.line(format!("\t:mp {}", float_str(penalty)));
    }
    if let Some(time) = model.procedural().default_action_time {
        w.line(format!("\t:dat {}", float_str(time)));
    }

    let trace_detail = match options.log_level {
        LogLevel::Min => "low",
        LogLevel::Info => "medium",
        LogLevel::Detail => "high",
    };
    w.line(format!("\t:trace-detail {trace_detail}"));

    if options.trace_activations {
        w.line("\t:act t");
    }

    if let Some(imaginal) = model.imaginal() {
        w.line("\t:do-not-harvest imaginal");
        if let Some(delay) = imaginal.delay {
            w.line(format!("\t:imaginal-delay {}", float_str(delay)));
        }
    }

    w.line(")");
    w.blank();
}

fn write_initializers(w: &mut CodeWriter, model: &Model, goal_override: Option<&Pattern>) {
    // declarative memory and the goal go into add-dm
    w.line(";; initialize our declarative memory");
    w.line("(add-dm");

    if model.has_implicit_chunks() {
        w.line(" ;; declare implicit chunks without slots to avoid warnings");
        let mut line = String::new();
        for chunk_name in &model.implicit_chunks {
            if line.len() + chunk_name.len() + 3 > 80 {
                w.line(&line);
                line.clear();
            }
            line.push_str(&format!(" ({chunk_name})"));
        }
        if !line.is_empty() {
            w.line(&line);
        }
        w.blank();
    }

    let mut fact_num = 0;
    let mut wrote_goal = false;
    for init in &model.initializers {
        match init.module_name.as_str() {
            "memory" => {
                w.line(format!(" ;; amod line {}", init.line));
                if let Some(name) = &init.chunk_name {
                    w.line(format!(" ({name}"));
                } else {
                    w.line(format!(" (fact_{fact_num}"));
                    fact_num += 1;
                }
                write_pattern(w, model, &init.pattern, 1);
                w.line(" )");
            }
            "goal" => {
                wrote_goal = true;
                if let Some(goal) = goal_override {
                    w.line(" ;; goal set by user");
                    w.line(" (goal");
                    write_pattern(w, model, goal, 1);
                    w.line(" )");
                } else {
                    w.line(format!(" ;; amod line {}", init.line));
                    w.line(" (goal");
                    write_pattern(w, model, &init.pattern, 1);
                    w.line(" )");
                }
            }
            _ => {}
        }
    }

    // a user goal with no model initializer to replace still gets set
    if !wrote_goal {
        if let Some(goal) = goal_override {
            w.line(" ;; goal set by user");
            w.line(" (goal");
            write_pattern(w, model, goal, 1);
            w.line(" )");
        }
    }

    w.line(")");
    w.blank();

    // now the other buffers
    for init in &model.initializers {
        match init.module_name.as_str() {
            "memory" | "goal" => {}

            "imaginal" => {
                w.line(";; initialize our \"imaginal\" buffer");
                w.line(format!(";; amod line {}", init.line));
                w.line("(define-chunks (imaginal_init");
                write_pattern(w, model, &init.pattern, 1);
                w.line("))");
                w.line("(set-buffer-chunk 'imaginal 'imaginal_init)");
                w.blank();
            }

            _ => {
                // extra buffers
                w.line(format!(";; initialize our \"{}\" buffer", init.buffer_name));
                w.line(format!(";; amod line {}", init.line));
                w.line(format!("(set-buffer-chunk '{} '(", init.buffer_name));
                write_pattern(w, model, &init.pattern, 1);
                w.line("))");
                w.blank();
            }
        }
    }
}

fn write_similarities(w: &mut CodeWriter, model: &Model) {
    if model.similarities.is_empty() {
        return;
    }

    w.line("(set-similarities");
    for similar in &model.similarities {
        w.line(format!("\t;; amod line {}", similar.line));
        w.line(format!(
            "\t({} {} {})",
            similar.chunk_one,
            similar.chunk_two,
            float_str(similar.value)
        ));
    }
    w.line(")");
    w.blank();
}

fn write_productions(w: &mut CodeWriter, model: &Model) {
    for production in &model.productions {
        w.line(format!(";; amod line {}", production.line));
        w.line(format!("(P {}", production.name));

        if let Some(description) = &production.description {
            w.line(format!("\t\"{description}\""));
        }

        for m in merge_matches(production) {
            match m {
                EmitMatch::Pattern { buffer, pattern } => {
                    w.line(format!("\t={buffer}>"));
                    write_pattern(w, model, pattern, 2);
                }
                EmitMatch::Query { buffer, checks } => {
                    w.line(format!("\t?{buffer}>"));
                    for (key, value) in checks {
                        w.line(format!("\t\t{key} {value}"));
                    }
                }
            }
        }

        w.line("\t==>");

        for statement in &production.do_statements {
            write_statement(w, model, statement);
        }

        w.line(")");
        w.blank();
    }
}

/// Emit `slotName value` pairs, one per line. `nil` becomes `empty`,
/// variables `?x` become `=x`, negation becomes a `-` prefix on the slot.
fn write_pattern(w: &mut CodeWriter, model: &Model, pattern: &Pattern, tabs: usize) {
    let indent = "\t".repeat(tabs.max(1));
    let chunk = model
        .lookup_chunk(&pattern.chunk_name)
        .expect("patterns are validated");

    w.line(format!("{indent}isa {}", pattern.chunk_name));

    for (index, slot) in pattern.slots.iter().enumerate() {
        if matches!(slot.value, PatternValue::Wildcard) {
            continue;
        }

        let slot_name = &chunk.slot_names[index];
        let prefix = if slot.negated { "- " } else { "" };
        w.line(format!(
            "{indent}{prefix}{slot_name} {}",
            slot_value(&slot.value)
        ));

        for constraint in &slot.constraints {
            let prefix = if constraint.compare == Compare::NotEqual {
                "- "
            } else {
                ""
            };
            w.line(format!(
                "{indent}{prefix}{slot_name} {}",
                constraint_value(&constraint.rhs)
            ));
        }
    }
}

fn slot_value(value: &PatternValue) -> String {
    match value {
        PatternValue::Wildcard => String::new(),
        PatternValue::Nil => "empty".to_string(),
        PatternValue::Ident(id) => id.clone(),
        PatternValue::Str(s) => format!("\"{s}\""),
        PatternValue::Number(n) => n.clone(),
        PatternValue::Var(name) => format!("={name}"),
    }
}

fn constraint_value(value: &Value) -> String {
    match value {
        Value::Nil => "empty".to_string(),
        Value::Var(name) => format!("={name}"),
        Value::Ident(id) => id.clone(),
        Value::Str(s) => format!("\"{s}\""),
        Value::Number(n) => n.clone(),
    }
}

fn write_statement(w: &mut CodeWriter, model: &Model, statement: &Statement) {
    match statement {
        Statement::Set(set) => {
            w.line(format!("\t={}>", set.buffer_name));

            if let Some(pattern) = &set.pattern {
                write_pattern(w, model, pattern, 2);
            } else if let Some(chunk_name) = &set.chunk_name {
                w.line(format!("\t\tisa {chunk_name}"));
                for slot in &set.slots {
                    w.line(format!(
                        "\t\t{} {}",
                        slot.name,
                        constraint_value(&slot.value)
                    ));
                }
            }
        }

        Statement::Recall {
            pattern,
            request_params,
            ..
        } => {
            w.line("\t+retrieval>");
            write_pattern(w, model, pattern, 2);
            for (param, value) in request_params {
                if param == "recently_retrieved" {
                    w.line(format!("\t\t:recently-retrieved {value}"));
                }
            }
        }

        Statement::Print { values } => {
            w.line(format!("\t!output!\t({})", output_args(values)));
        }

        Statement::Clear { buffer_names } => {
            for name in buffer_names {
                w.line(format!("\t-{name}>"));
            }
        }

        Statement::Stop => {
            w.line("\t!stop!");
        }
    }
}

/// Build the `!output!` argument list: a printf-style format string with
/// `~a` placeholders followed by the variable references.
///
/// See "!output!" in the ACT-R 7.21+ reference manual.
fn output_args(values: &[Value]) -> String {
    let mut format_str = String::from("\"");
    let mut args = Vec::new();

    for value in values {
        match value {
            Value::Var(name) => {
                format_str.push_str("~a");
                args.push(format!("={name}"));
            }
            Value::Str(s) => format_str.push_str(s),
            Value::Number(n) => format_str.push_str(n),
            // IDs and nil are rejected during validation
            Value::Ident(id) => format_str.push_str(id),
            Value::Nil => format_str.push_str("empty"),
        }
    }

    format_str.push('"');

    for arg in args {
        format_str.push(' ');
        format_str.push_str(&arg);
    }

    format_str
}
