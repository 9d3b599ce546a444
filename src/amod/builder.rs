//! Walks the parse tree, builds the model, and performs every semantic
//! validation.
//!
//! Stages run in source order: model header, config, init, productions.
//! Each check is independent: a failure records an issue and moves on so a
//! single compile surfaces as many defects as possible. Dependent
//! sub-checks are skipped (a slot-existence check is pointless when the
//! chunk type is unknown), and the productions stage is skipped entirely
//! when the chunk declarations could not be built.

use std::collections::HashMap;

use super::ast;
use crate::issues::{Location, Log};
use crate::model::params::{self, ParamError, ParamSpec, ParamValue};
use crate::model::{
    Chunk, Compare, Constraint, INTERNAL_STATUS_CHUNK, Initializer, Match, Model, Pattern,
    PatternSlot, PatternValue, Production, SetSlot, SetStatement, Similarity, Statement, Value,
    VarIndex,
};

/// Identifiers which cannot be used as chunk type names.
const RESERVED_NAMES: &[&str] = &["goal", "memory", "retrieval", "procedural", "imaginal"];

const BUFFER_STATES: &[&str] = &["empty", "full"];
const MODULE_STATES: &[&str] = &["busy", "error"];

pub fn build(file: &ast::File, log: &mut Log) -> Model {
    let mut model = Model::new(file.model.name.clone());
    model.description = file.model.description.clone();
    model.authors = file.model.authors.clone();

    let chunks_ok = add_config(&mut model, log, &file.config);
    add_examples(&mut model, log, &file.model.examples);
    add_init(&mut model, log, &file.init);

    // productions cross-reference chunk types everywhere; without a clean
    // chunk list they would only produce noise
    if chunks_ok {
        add_productions(&mut model, log, &file.productions);
    }

    model.finalize_implicit_chunks();

    model
}

// ─── config ────────────────────────────────────────────────────────────

fn add_config(model: &mut Model, log: &mut Log, config: &ast::ConfigSection) -> bool {
    add_gactar(model, log, &config.gactar);
    add_modules(model, log, &config.modules);
    add_chunks(model, log, &config.chunks)
}

fn param_value(value: &ast::FieldValue) -> ParamValue<'_> {
    match value {
        ast::FieldValue::Ident(s) => ParamValue::Ident(s),
        ast::FieldValue::Str(s) => ParamValue::Str(s),
        ast::FieldValue::Number(n) => ParamValue::Number(*n),
        ast::FieldValue::Fields(_) => ParamValue::Fields,
    }
}

/// Number rendering used in module parameter errors,
/// e.g. `imaginal delay '-0.500000' must be a positive number`.
fn number_display(value: &ast::FieldValue) -> String {
    match value {
        ast::FieldValue::Number(n) => format!("{n:.6}"),
        other => other.display(),
    }
}

/// Report duplicate keys within one field list (recursing into nested
/// lists).
fn validate_field_list(log: &mut Log, fields: &[ast::Field]) {
    let mut seen: Vec<&str> = Vec::new();

    for field in fields {
        if seen.contains(&field.key.as_str()) {
            log.error(
                Some(field.key_loc),
                format!("duplicate option \"{}\"", field.key),
            );
        } else {
            seen.push(&field.key);
        }

        if let ast::FieldValue::Fields(nested) = &field.value {
            validate_field_list(log, nested);
        }
    }
}

fn add_gactar(model: &mut Model, log: &mut Log, fields: &[ast::Field]) {
    validate_field_list(log, fields);

    for field in fields {
        let value = param_value(&field.value);
        if let Err(err) = params::validate(params::GACTAR_PARAMS, &field.key, &value) {
            match err {
                ParamError::UnrecognizedOption(_) => {
                    log.error(Some(field.key_loc), format!("{err} in gactar section"));
                }
                _ => {
                    log.error(
                        Some(field.value_loc),
                        format!("{} ({}) {err}", field.key, field.value.display()),
                    );
                }
            }
            continue;
        }

        match (field.key.as_str(), &field.value) {
            ("log_level", ast::FieldValue::Str(level)) => {
                // the schema restricted the value to the valid set
                model.options.log_level = level.parse().expect("validated log level");
            }
            ("trace_activations", ast::FieldValue::Ident(b)) => {
                model.options.trace_activations = b == "true";
            }
            ("random_seed", ast::FieldValue::Number(n)) => {
                model.options.random_seed = Some(*n as u32);
            }
            _ => {}
        }
    }
}

fn add_modules(model: &mut Model, log: &mut Log, configs: &[ast::ModuleConfig]) {
    let mut goal_config_loc = None;

    for config in configs {
        validate_field_list(log, &config.fields);

        match config.name.as_str() {
            "memory" => add_memory(model, log, &config.fields),
            "goal" => {
                goal_config_loc = Some(config.name_loc);
                add_goal(model, log, &config.fields);
            }
            "imaginal" => add_imaginal(model, log, &config.fields),
            "procedural" => add_procedural(model, log, &config.fields),
            "extra_buffers" => add_extra_buffers(model, log, &config.fields),
            other => {
                log.error(
                    Some(config.name_loc),
                    format!("unrecognized module in config: '{other}'"),
                );
            }
        }
    }

    // spreading activation on the goal buffer needs the memory module's
    // calculation turned on
    if model.goal().spreading_activation.is_some()
        && model.memory().max_spread_strength.is_none()
    {
        log.error(
            goal_config_loc,
            "spreading_activation set on buffer \"goal\", \
             but max_spread_strength not set on memory module",
        );
    }
}

/// Validate all fields of a module config against its schema and hand back
/// the numeric ones that passed.
fn module_number_params(
    log: &mut Log,
    module_name: &str,
    schema: &'static [ParamSpec],
    fields: &[ast::Field],
) -> Vec<(String, f64)> {
    let mut numbers = Vec::new();

    for field in fields {
        let value = param_value(&field.value);
        match params::validate(schema, &field.key, &value) {
            Ok(()) => {
                if let ast::FieldValue::Number(n) = &field.value {
                    numbers.push((field.key.clone(), *n));
                }
            }
            Err(err @ ParamError::UnrecognizedOption(_)) => {
                log.error(
                    Some(field.key_loc),
                    format!("{err} in {module_name} config"),
                );
            }
            Err(err) => {
                log.error(
                    Some(field.value_loc),
                    format!(
                        "{module_name} {} '{}' {err}",
                        field.key,
                        number_display(&field.value)
                    ),
                );
            }
        }
    }

    numbers
}

fn add_memory(model: &mut Model, log: &mut Log, fields: &[ast::Field]) {
    let values = module_number_params(log, "memory", params::MEMORY_PARAMS, fields);

    let memory = model.memory_mut();
    for (key, n) in values {
        match key.as_str() {
            "latency_factor" => memory.latency_factor = Some(n),
            "latency_exponent" => memory.latency_exponent = Some(n),
            "retrieval_threshold" => memory.retrieval_threshold = Some(n),
            "finst_size" => memory.finst_size = Some(n as i64),
            "finst_time" => memory.finst_time = Some(n),
            "decay" => memory.decay = Some(n),
            "max_spread_strength" => memory.max_spread_strength = Some(n),
            "instantaneous_noise" => memory.instantaneous_noise = Some(n),
            "mismatch_penalty" => memory.mismatch_penalty = Some(n),
            _ => unreachable!("validated against schema"),
        }
    }
}

fn add_goal(model: &mut Model, log: &mut Log, fields: &[ast::Field]) {
    let values = module_number_params(log, "goal", params::GOAL_PARAMS, fields);

    let goal = model.goal_mut();
    for (key, n) in values {
        match key.as_str() {
            "spreading_activation" => goal.spreading_activation = Some(n),
            _ => unreachable!("validated against schema"),
        }
    }
}

fn add_imaginal(model: &mut Model, log: &mut Log, fields: &[ast::Field]) {
    let values = module_number_params(log, "imaginal", params::IMAGINAL_PARAMS, fields);

    let imaginal = model.create_imaginal();
    for (key, n) in values {
        match key.as_str() {
            "delay" => imaginal.delay = Some(n),
            _ => unreachable!("validated against schema"),
        }
    }
}

fn add_procedural(model: &mut Model, log: &mut Log, fields: &[ast::Field]) {
    let values = module_number_params(log, "procedural", params::PROCEDURAL_PARAMS, fields);

    let procedural = model.procedural_mut();
    for (key, n) in values {
        match key.as_str() {
            "default_action_time" => procedural.default_action_time = Some(n),
            _ => unreachable!("validated against schema"),
        }
    }
}

fn add_extra_buffers(model: &mut Model, log: &mut Log, fields: &[ast::Field]) {
    // dynamic schema: every key declares a new goal-style buffer
    let mut new_buffers = Vec::new();

    for field in fields {
        let name = &field.key;

        if name.starts_with('_') || RESERVED_NAMES.contains(&name.as_str()) {
            log.error(
                Some(field.key_loc),
                format!("cannot use reserved buffer name \"{name}\""),
            );
            continue;
        }
        if model.has_buffer(name) {
            log.error(
                Some(field.key_loc),
                format!("buffer \"{name}\" already exists in the model"),
            );
            continue;
        }

        new_buffers.push(crate::model::modules::Buffer {
            name: name.clone(),
            multiple_init: false,
        });
    }

    let extra = model.create_extra_buffers();
    for buffer in new_buffers {
        if !extra.buffers.iter().any(|b| b.name == buffer.name) {
            extra.buffers.push(buffer);
        }
    }
}

fn add_chunks(model: &mut Model, log: &mut Log, chunks: &[ast::ChunkDecl]) -> bool {
    let mut ok = true;

    for decl in chunks {
        if decl.name.starts_with('_') {
            log.error(
                Some(decl.name_loc),
                format!(
                    "cannot use reserved chunk type \"{}\" \
                     (chunks beginning with '_' are reserved)",
                    decl.name
                ),
            );
            ok = false;
            continue;
        }

        if RESERVED_NAMES.contains(&decl.name.as_str()) {
            log.error(
                Some(decl.name_loc),
                format!("cannot use reserved chunk type \"{}\"", decl.name),
            );
            ok = false;
            continue;
        }

        if model.lookup_chunk(&decl.name).is_some() {
            log.error(
                Some(decl.name_loc),
                format!("duplicate chunk type: '{}'", decl.name),
            );
            ok = false;
            continue;
        }

        let mut seen = Vec::new();
        let mut slots_ok = true;
        for slot in &decl.slots {
            if seen.contains(&slot.as_str()) {
                log.error(
                    Some(decl.name_loc),
                    format!(
                        "duplicate slot name \"{slot}\" in chunk type '{}'",
                        decl.name
                    ),
                );
                slots_ok = false;
            } else {
                seen.push(slot);
            }
        }
        if !slots_ok {
            ok = false;
            continue;
        }

        model.chunks.push(Chunk {
            name: decl.name.clone(),
            slot_names: decl.slots.clone(),
            line: decl.name_loc.line,
        });
    }

    ok
}

// ─── examples ──────────────────────────────────────────────────────────

fn add_examples(model: &mut Model, log: &mut Log, examples: &[ast::Pattern]) {
    for example in examples {
        if validate_pattern(model, log, example).is_err() {
            continue;
        }
        let pattern = create_chunk_pattern(example);
        model.examples.push(pattern);
    }
}

// ─── patterns ──────────────────────────────────────────────────────────

/// Validate a pattern supplied from outside the amod source (e.g. a goal
/// typed by the user), against the model's chunk types.
pub fn validate_user_pattern(
    model: &Model,
    log: &mut Log,
    pattern: &ast::Pattern,
) -> Result<(), ()> {
    validate_pattern(model, log, pattern)
}

/// Convert an externally-supplied pattern to its model form.
pub fn user_pattern(pattern: &ast::Pattern) -> Pattern {
    create_chunk_pattern(pattern)
}

/// Check a pattern's chunk type and slot count. Every pattern anywhere in
/// the model goes through here.
fn validate_pattern(model: &Model, log: &mut Log, pattern: &ast::Pattern) -> Result<(), ()> {
    let Some(chunk) = model.lookup_chunk(&pattern.chunk_name) else {
        log.error(
            Some(pattern.chunk_name_loc),
            format!("could not find chunk named '{}'", pattern.chunk_name),
        );
        return Err(());
    };

    if pattern.slots.len() != chunk.num_slots() {
        let plural = if chunk.num_slots() == 1 { "slot" } else { "slots" };
        log.error(
            Some(pattern.loc),
            format!(
                "invalid chunk - '{}' expects {} {plural}",
                chunk.name,
                chunk.num_slots()
            ),
        );
        return Err(());
    }

    Ok(())
}

fn create_chunk_pattern(pattern: &ast::Pattern) -> Pattern {
    let slots = pattern
        .slots
        .iter()
        .map(|slot| PatternSlot {
            negated: slot.negated,
            value: match &slot.item {
                ast::PatternSlotItem::Wildcard => PatternValue::Wildcard,
                ast::PatternSlotItem::Nil => PatternValue::Nil,
                ast::PatternSlotItem::Ident(s) => PatternValue::Ident(s.clone()),
                ast::PatternSlotItem::Str(s) => PatternValue::Str(s.clone()),
                ast::PatternSlotItem::Number(s) => PatternValue::Number(s.clone()),
                ast::PatternSlotItem::Var(s) => PatternValue::Var(s.clone()),
            },
            constraints: Vec::new(),
        })
        .collect();

    Pattern {
        chunk_name: pattern.chunk_name.clone(),
        slots,
    }
}

fn arg_to_value(arg: &ast::Arg) -> Value {
    match &arg.value {
        ast::ArgValue::Nil => Value::Nil,
        ast::ArgValue::Var(v) => Value::Var(v.clone()),
        ast::ArgValue::Ident(s) => Value::Ident(s.clone()),
        ast::ArgValue::Str(s) => Value::Str(s.clone()),
        ast::ArgValue::Number(n) => Value::Number(n.clone()),
    }
}

// ─── init ──────────────────────────────────────────────────────────────

fn add_init(model: &mut Model, log: &mut Log, init: &ast::InitSection) {
    for initialization in &init.initializers {
        add_initialization(model, log, initialization);
    }

    for similar in &init.similarities {
        if !(-1.0..=0.0).contains(&similar.value) {
            log.error(
                Some(similar.loc),
                format!(
                    "similarity value '{}' must be between -1 and 0",
                    crate::numbers::float_str(similar.value)
                ),
            );
            continue;
        }

        model.add_similarity(Similarity {
            chunk_one: similar.chunk_one.clone(),
            chunk_two: similar.chunk_two.clone(),
            value: similar.value,
            line: similar.loc.line,
        });
    }
}

fn add_initialization(model: &mut Model, log: &mut Log, init: &ast::Initialization) {
    // the head names a module, or one of the extra buffers directly
    let (module_name, buffer_name) = if let Some(module) = model.lookup_module(&init.name) {
        let Some(buffer) = module.buffers().first() else {
            log.error(
                Some(init.name_loc),
                format!("module '{}' does not have any buffers", init.name),
            );
            return;
        };
        (module.name().to_string(), buffer.name.clone())
    } else if let Some(module) = model.lookup_buffer(&init.name) {
        (module.name().to_string(), init.name.clone())
    } else {
        log.error(
            Some(init.name_loc),
            format!("module '{}' not found in initialization", init.name),
        );
        return;
    };

    let module = model.lookup_module(&module_name).expect("resolved above");
    let multiple_init = module.allows_multiple_init();

    if !multiple_init {
        if init.patterns.len() > 1 {
            log.error(
                Some(init.name_loc),
                format!(
                    "module \"{module_name}\" should only have one pattern \
                     in initialization of buffer \"{buffer_name}\""
                ),
            );
            return;
        }
        if model.lookup_initializer(&buffer_name).is_some() {
            log.error(
                Some(init.name_loc),
                format!("buffer \"{buffer_name}\" should only have one initialization"),
            );
            return;
        }
    }

    for entry in &init.patterns {
        if let Some(chunk_name) = &entry.chunk_name {
            if model.explicit_chunks.contains(chunk_name) {
                log.error(
                    Some(entry.loc),
                    format!("duplicate chunk name \"{chunk_name}\" found in initialization"),
                );
                continue;
            }
        }

        if validate_pattern(model, log, &entry.pattern).is_err() {
            continue;
        }
        if validate_initializer_pattern(log, &entry.pattern).is_err() {
            continue;
        }

        model.add_initializer(Initializer {
            module_name: module_name.clone(),
            buffer_name: buffer_name.clone(),
            chunk_name: entry.chunk_name.clone(),
            pattern: create_chunk_pattern(&entry.pattern),
            line: entry.loc.line,
        });
    }
}

/// Initializer patterns describe concrete chunks, so variables and
/// wildcards make no sense in them.
fn validate_initializer_pattern(log: &mut Log, pattern: &ast::Pattern) -> Result<(), ()> {
    let mut ok = Ok(());

    for slot in &pattern.slots {
        match slot.item {
            ast::PatternSlotItem::Var(_) => {
                log.error(Some(slot.loc), "cannot use a variable in an initializer");
                ok = Err(());
            }
            ast::PatternSlotItem::Wildcard => {
                log.error(Some(slot.loc), "cannot use a wildcard in an initializer");
                ok = Err(());
            }
            _ => {}
        }
    }

    ok
}

// ─── productions ───────────────────────────────────────────────────────

fn add_productions(model: &mut Model, log: &mut Log, productions: &[ast::ProductionDecl]) {
    for decl in productions {
        if let Some(production) = build_production(model, log, decl) {
            model.productions.push(production);
        }
    }
}

fn build_production(
    model: &mut Model,
    log: &mut Log,
    decl: &ast::ProductionDecl,
) -> Option<Production> {
    let mut production = Production {
        name: decl.name.clone(),
        description: decl.description.clone(),
        matches: Vec::new(),
        do_statements: Vec::new(),
        var_indexes: Default::default(),
        line: decl.line,
    };

    if build_matches(model, log, decl, &mut production).is_err() {
        return None;
    }

    attach_where_clauses(log, decl, &mut production);

    let mut recall_count = 0;
    for statement in &decl.statements {
        add_statement(model, log, statement, &mut production, &mut recall_count);
    }

    check_variable_usage(log, decl);

    Some(production)
}

fn build_matches(
    model: &Model,
    log: &mut Log,
    decl: &ast::ProductionDecl,
    production: &mut Production,
) -> Result<(), ()> {
    let mut ok = Ok(());

    for item in &decl.matches {
        match item {
            ast::MatchItem::State {
                name,
                name_loc,
                state,
                state_loc,
            } => {
                if !model.has_buffer(name) {
                    log.error(
                        Some(*name_loc),
                        format!("buffer '{name}' not found in production '{}'", decl.name),
                    );
                    ok = Err(());
                    continue;
                }

                if !BUFFER_STATES.contains(&state.as_str()) {
                    log.error(
                        Some(*state_loc),
                        format!(
                            "invalid state '{state}' for buffer '{name}' in production '{}' \
                             (should be 'empty' or 'full')",
                            decl.name
                        ),
                    );
                    ok = Err(());
                    continue;
                }

                production.matches.push(Match::BufferState {
                    buffer_name: name.clone(),
                    state: state.clone(),
                });
            }

            ast::MatchItem::Pattern {
                name,
                name_loc,
                pattern,
                when: _,
            } => {
                if pattern.chunk_name == INTERNAL_STATUS_CHUNK {
                    if build_module_state_match(model, log, decl, production, name, name_loc, pattern)
                        .is_err()
                    {
                        ok = Err(());
                    }
                    continue;
                }

                if !model.has_buffer(name) {
                    log.error(
                        Some(*name_loc),
                        format!("buffer '{name}' not found in production '{}'", decl.name),
                    );
                    ok = Err(());
                    continue;
                }

                if validate_pattern(model, log, pattern).is_err() {
                    ok = Err(());
                    continue;
                }

                let chunk = model
                    .lookup_chunk(&pattern.chunk_name)
                    .expect("validated above");
                let model_pattern = create_chunk_pattern(pattern);

                // the first pattern binding a variable decides where later
                // statements resolve it
                for (index, slot) in model_pattern.slots.iter().enumerate() {
                    if let Some(var) = slot.var_name() {
                        production
                            .var_indexes
                            .entry(var.to_string())
                            .or_insert_with(|| VarIndex {
                                buffer_name: name.clone(),
                                slot_name: chunk.slot_names[index].clone(),
                            });
                    }
                }

                production.matches.push(Match::BufferPattern {
                    buffer_name: name.clone(),
                    pattern: model_pattern,
                });
            }
        }
    }

    ok
}

fn build_module_state_match(
    model: &Model,
    log: &mut Log,
    decl: &ast::ProductionDecl,
    production: &mut Production,
    name: &str,
    name_loc: &Location,
    pattern: &ast::Pattern,
) -> Result<(), ()> {
    // `memory [_status: busy]`; a buffer name resolves to its module
    let module = model
        .lookup_module(name)
        .or_else(|| model.lookup_buffer(name));
    let Some(module) = module else {
        log.error(
            Some(*name_loc),
            format!("buffer '{name}' not found in production '{}'", decl.name),
        );
        return Err(());
    };

    let Some(buffer) = module.buffers().first() else {
        log.error(
            Some(*name_loc),
            format!("module '{name}' does not have any buffers"),
        );
        return Err(());
    };

    validate_pattern(model, log, pattern)?;

    let slot = &pattern.slots[0];
    let state = match (&slot.item, slot.negated) {
        (ast::PatternSlotItem::Ident(state), false)
            if MODULE_STATES.contains(&state.as_str()) =>
        {
            state.clone()
        }
        _ => {
            let text = match &slot.item {
                ast::PatternSlotItem::Ident(s) => s.clone(),
                ast::PatternSlotItem::Str(s) => format!("'{s}'"),
                ast::PatternSlotItem::Number(s) => s.clone(),
                ast::PatternSlotItem::Var(s) => format!("?{s}"),
                ast::PatternSlotItem::Nil => "nil".to_string(),
                ast::PatternSlotItem::Wildcard => "*".to_string(),
            };
            log.error(
                Some(slot.loc),
                format!(
                    "invalid _status '{text}' for '{name}' in production '{}' \
                     (should be 'busy' or 'error')",
                    decl.name
                ),
            );
            return Err(());
        }
    };

    production.matches.push(Match::ModuleState {
        module_name: module.name().to_string(),
        buffer_name: buffer.name.clone(),
        state,
    });

    Ok(())
}

fn attach_where_clauses(log: &mut Log, decl: &ast::ProductionDecl, production: &mut Production) {
    for item in &decl.matches {
        let ast::MatchItem::Pattern { when, .. } = item else {
            continue;
        };

        for expr in when {
            let Some(var_index) = production.var_indexes.get(&expr.lhs).cloned() else {
                log.error(
                    Some(expr.lhs_loc),
                    format!(
                        "where clause variable '?{}' not found in matches for production '{}'",
                        expr.lhs, decl.name
                    ),
                );
                continue;
            };

            if let ast::ArgValue::Var(rhs_var) = &expr.rhs.value {
                if *rhs_var == expr.lhs {
                    log.error(
                        Some(expr.loc),
                        format!(
                            "variable '?{}' cannot be compared to itself in production '{}'",
                            expr.lhs, decl.name
                        ),
                    );
                    continue;
                }
                if !production.var_indexes.contains_key(rhs_var) {
                    log.error(
                        Some(expr.rhs.loc),
                        format!(
                            "where clause variable '?{rhs_var}' not found in matches \
                             for production '{}'",
                            decl.name
                        ),
                    );
                    continue;
                }
            }

            attach_constraint(log, decl, production, &var_index, expr);
        }
    }
}

fn attach_constraint(
    log: &mut Log,
    decl: &ast::ProductionDecl,
    production: &mut Production,
    var_index: &VarIndex,
    expr: &ast::WhereExpr,
) {
    for m in &mut production.matches {
        let Match::BufferPattern {
            buffer_name,
            pattern,
        } = m
        else {
            continue;
        };
        if *buffer_name != var_index.buffer_name {
            continue;
        }

        for slot in &mut pattern.slots {
            if slot.var_name() != Some(expr.lhs.as_str()) {
                continue;
            }

            if slot.negated {
                log.error(
                    Some(expr.lhs_loc),
                    format!(
                        "cannot constrain negated variable '?{}' in production '{}'",
                        expr.lhs, decl.name
                    ),
                );
                return;
            }

            slot.constraints.push(Constraint {
                compare: if expr.negated {
                    Compare::NotEqual
                } else {
                    Compare::Equal
                },
                rhs: arg_to_value(&expr.rhs),
            });
            return;
        }
    }
}

// ─── do statements ─────────────────────────────────────────────────────

fn add_statement(
    model: &mut Model,
    log: &mut Log,
    statement: &ast::StatementDecl,
    production: &mut Production,
    recall_count: &mut usize,
) {
    match statement {
        ast::StatementDecl::Clear { buffers, .. } => {
            let mut ok = true;
            for (name, loc) in buffers {
                if !model.has_buffer(name) {
                    log.error(
                        Some(*loc),
                        format!(
                            "buffer '{name}' not found in production '{}'",
                            production.name
                        ),
                    );
                    ok = false;
                }
            }
            if ok {
                production.do_statements.push(Statement::Clear {
                    buffer_names: buffers.iter().map(|(n, _)| n.clone()).collect(),
                });
            }
        }

        ast::StatementDecl::Print { args, .. } => {
            let mut ok = true;
            for arg in args {
                match &arg.value {
                    ast::ArgValue::Var(var) => {
                        if !production.var_indexes.contains_key(var) {
                            log.error(
                                Some(arg.loc),
                                format!(
                                    "print statement variable '?{var}' not found in matches \
                                     for production '{}'",
                                    production.name
                                ),
                            );
                            ok = false;
                        }
                    }
                    ast::ArgValue::Ident(id) => {
                        log.error(
                            Some(arg.loc),
                            format!("cannot use ID '{id}' in print statement"),
                        );
                        ok = false;
                    }
                    ast::ArgValue::Nil => {
                        log.error(Some(arg.loc), "cannot use nil in print statement");
                        ok = false;
                    }
                    _ => {}
                }
            }
            if ok {
                production.do_statements.push(Statement::Print {
                    values: args.iter().map(arg_to_value).collect(),
                });
            }
        }

        ast::StatementDecl::Recall { pattern, with, loc } => {
            *recall_count += 1;
            if *recall_count > 1 {
                log.error(
                    Some(*loc),
                    format!(
                        "only one recall statement per production is allowed \
                         in production '{}'",
                        production.name
                    ),
                );
                return;
            }

            if validate_pattern(model, log, pattern).is_err() {
                return;
            }

            let mut ok = true;
            for slot in &pattern.slots {
                if let ast::PatternSlotItem::Var(var) = &slot.item {
                    if !production.var_indexes.contains_key(var) {
                        log.error(
                            Some(slot.loc),
                            format!(
                                "recall statement variable '?{var}' not found in matches \
                                 for production '{}'",
                                production.name
                            ),
                        );
                        ok = false;
                    }
                }
            }

            let mut request_params = Vec::new();
            for field in with {
                let value = param_value(&field.value);
                if let Err(err) = params::validate(params::RECALL_PARAMS, &field.key, &value) {
                    log.error(Some(field.key_loc), format!("recall 'with': {err}"));
                    ok = false;
                    continue;
                }
                request_params.push((field.key.clone(), field.value.display()));
            }

            if ok {
                let model_pattern = create_chunk_pattern(pattern);
                model.add_implicit_chunks_from_pattern(&model_pattern);
                production.do_statements.push(Statement::Recall {
                    pattern: model_pattern,
                    memory_module_name: "memory".to_string(),
                    request_params,
                });
            }
        }

        ast::StatementDecl::Set {
            buffer,
            buffer_loc,
            slot,
            value,
            loc,
        } => {
            add_set_statement(model, log, production, buffer, buffer_loc, slot, value, loc);
        }

        ast::StatementDecl::Stop { .. } => {
            production.do_statements.push(Statement::Stop);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn add_set_statement(
    model: &mut Model,
    log: &mut Log,
    production: &mut Production,
    buffer: &str,
    buffer_loc: &Location,
    slot: &Option<(String, Location)>,
    value: &ast::SetValue,
    loc: &Location,
) {
    if !model.has_buffer(buffer) {
        log.error(
            Some(*buffer_loc),
            format!("buffer \"{buffer}\" not found in model"),
        );
        return;
    }

    let Some(match_pattern) = production.lookup_match_by_buffer(buffer) else {
        log.error(
            Some(*buffer_loc),
            format!(
                "match buffer '{buffer}' not found in production '{}'",
                production.name
            ),
        );
        return;
    };
    let chunk_name = match_pattern.chunk_name.clone();

    if let Some((slot_name, slot_loc)) = slot {
        // set <buffer>.<slot> to <value>
        let ast::SetValue::Arg(arg) = value else {
            log.error(
                Some(*loc),
                format!(
                    "cannot set a slot ('{buffer}.{slot_name}') to a pattern \
                     in production '{}'",
                    production.name
                ),
            );
            return;
        };

        let chunk = model.lookup_chunk(&chunk_name).expect("match was validated");
        let Some(index) = chunk.slot_index(slot_name) else {
            log.error(
                Some(*slot_loc),
                format!(
                    "slot '{slot_name}' does not exist in chunk type '{chunk_name}' \
                     for match buffer '{buffer}' in production '{}'",
                    production.name
                ),
            );
            return;
        };

        if let ast::ArgValue::Var(var) = &arg.value {
            if !production.var_indexes.contains_key(var) {
                log.error(
                    Some(arg.loc),
                    format!(
                        "set statement variable '?{var}' not found in matches \
                         for production '{}'",
                        production.name
                    ),
                );
                return;
            }
        }
        if let ast::ArgValue::Ident(id) = &arg.value {
            model.add_implicit_chunk(id.clone());
        }

        let set_slot = SetSlot {
            name: slot_name.clone(),
            index,
            value: arg_to_value(arg),
        };

        // consecutive slot sets on the same buffer fold into one statement
        if let Some(existing) = lookup_set_statement(production, buffer) {
            existing.chunk_name = Some(chunk_name);
            existing.slots.push(set_slot);
        } else {
            production.do_statements.push(Statement::Set(SetStatement {
                buffer_name: buffer.to_string(),
                chunk_name: Some(chunk_name),
                slots: vec![set_slot],
                pattern: None,
            }));
        }
    } else {
        // set <buffer> to <pattern>
        let ast::SetValue::Pattern(pattern) = value else {
            let ast::SetValue::Arg(arg) = value else {
                unreachable!()
            };
            log.error(
                Some(arg.loc),
                format!(
                    "buffer '{buffer}' must be set to a pattern in production '{}'",
                    production.name
                ),
            );
            return;
        };

        if validate_pattern(model, log, pattern).is_err() {
            return;
        }

        let mut ok = true;
        for slot in &pattern.slots {
            if let ast::PatternSlotItem::Var(var) = &slot.item {
                if !production.var_indexes.contains_key(var) {
                    log.error(
                        Some(slot.loc),
                        format!(
                            "set statement variable '?{var}' not found in matches \
                             for production '{}'",
                            production.name
                        ),
                    );
                    ok = false;
                }
            }
        }
        if !ok {
            return;
        }

        let model_pattern = create_chunk_pattern(pattern);
        model.add_implicit_chunks_from_pattern(&model_pattern);

        if let Some(existing) = lookup_set_statement(production, buffer) {
            existing.pattern = Some(model_pattern);
            existing.slots.clear();
            existing.chunk_name = None;
        } else {
            production.do_statements.push(Statement::Set(SetStatement {
                buffer_name: buffer.to_string(),
                chunk_name: None,
                slots: Vec::new(),
                pattern: Some(model_pattern),
            }));
        }
    }
}

fn lookup_set_statement<'a>(
    production: &'a mut Production,
    buffer: &str,
) -> Option<&'a mut SetStatement> {
    production.do_statements.iter_mut().find_map(|s| match s {
        Statement::Set(set) if set.buffer_name == buffer => Some(set),
        _ => None,
    })
}

// ─── variable usage ────────────────────────────────────────────────────

/// A variable bound in a match pattern must be used: either it unifies
/// (appears at least twice in the matches), or something else in the
/// production refers to it - a where clause, a recall, a set, or a print.
/// A variable matched once and never referenced should have been `*`.
fn check_variable_usage(log: &mut Log, decl: &ast::ProductionDecl) {
    // name -> (first location in a match pattern, total occurrence count);
    // only variables bound in the matches are tracked - unbound references
    // are reported by the statement checks
    let mut bound: HashMap<&str, (Location, usize)> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for item in &decl.matches {
        let ast::MatchItem::Pattern { pattern, .. } = item else {
            continue;
        };
        for slot in &pattern.slots {
            if let ast::PatternSlotItem::Var(name) = &slot.item {
                let entry = bound.entry(name.as_str()).or_insert_with(|| {
                    order.push(name.as_str());
                    (slot.loc, 0)
                });
                entry.1 += 1;
            }
        }
    }

    fn reference(bound: &mut HashMap<&str, (Location, usize)>, name: &str) {
        if let Some(entry) = bound.get_mut(name) {
            entry.1 += 1;
        }
    }

    for item in &decl.matches {
        let ast::MatchItem::Pattern { when, .. } = item else {
            continue;
        };
        for expr in when {
            reference(&mut bound, &expr.lhs);
            if let ast::ArgValue::Var(rhs) = &expr.rhs.value {
                reference(&mut bound, rhs);
            }
        }
    }

    for statement in &decl.statements {
        match statement {
            ast::StatementDecl::Print { args, .. } => {
                for arg in args {
                    if let ast::ArgValue::Var(name) = &arg.value {
                        reference(&mut bound, name);
                    }
                }
            }
            ast::StatementDecl::Recall { pattern, .. } => {
                for slot in &pattern.slots {
                    if let ast::PatternSlotItem::Var(name) = &slot.item {
                        reference(&mut bound, name);
                    }
                }
            }
            ast::StatementDecl::Set { value, .. } => match value {
                ast::SetValue::Arg(arg) => {
                    if let ast::ArgValue::Var(name) = &arg.value {
                        reference(&mut bound, name);
                    }
                }
                ast::SetValue::Pattern(pattern) => {
                    for slot in &pattern.slots {
                        if let ast::PatternSlotItem::Var(name) = &slot.item {
                            reference(&mut bound, name);
                        }
                    }
                }
            },
            _ => {}
        }
    }

    for name in order {
        let (loc, count) = bound[name];
        if count == 1 {
            log.error(
                Some(loc),
                format!("variable ?{name} is not used - should be simplified to '*'"),
            );
        }
    }
}
