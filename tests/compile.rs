//! End-to-end compilation scenarios: source in, rendered issue log out.

use gactar::amod;
use gactar::issues::Log;

fn compile(src: &str) -> (Option<gactar::model::Model>, String) {
    let mut log = Log::new();
    let model = amod::generate_model(src, &mut log);
    (model, log.to_string())
}

fn assert_clean(src: &str) -> gactar::model::Model {
    let (model, log) = compile(src);
    assert_eq!(log, "", "expected no issues");
    model.expect("model compiles")
}

fn assert_error(src: &str, expected: &str) {
    let (model, log) = compile(src);
    assert!(model.is_none(), "expected compilation to fail:\n{log}");
    assert!(
        log.contains(expected),
        "expected log to contain {expected:?}, got:\n{log}"
    );
}

// ─── model section ─────────────────────────────────────────────────────

#[test]
fn minimum_model() {
    let model = assert_clean(
        "~~ model ~~
         name: Test
         ~~ config ~~
         ~~ init ~~
         ~~ productions ~~",
    );
    assert_eq!(model.name, "Test");
    assert!(model.productions.is_empty());
}

#[test]
fn model_authors_and_description() {
    let model = assert_clean(
        "~~ model ~~
         name: Test
         description: 'a test model' // trailing comment
         authors {
             'Some One <someone@example.com>'
             'An Other'
         }
         ~~ config ~~
         ~~ init ~~
         ~~ productions ~~",
    );
    assert_eq!(model.authors.len(), 2);
    assert_eq!(model.description.as_deref(), Some("a test model"));
}

#[test]
fn model_example_with_unknown_chunk() {
    assert_error(
        "~~ model ~~
         name: Test
         examples { [foo: bar] }
         ~~ config ~~
         ~~ init ~~
         ~~ productions ~~",
        "ERROR: could not find chunk named 'foo'",
    );
}

#[test]
fn model_example_validated_against_config_chunks() {
    let model = assert_clean(
        "~~ model ~~
         name: Test
         examples { [foo: bar] }
         ~~ config ~~
         chunks { [foo: thing] }
         ~~ init ~~
         ~~ productions ~~",
    );
    assert_eq!(model.examples.len(), 1);
}

// ─── gactar config ─────────────────────────────────────────────────────

#[test]
fn gactar_all_options() {
    let model = assert_clean(
        "~~ model ~~
         name: Test
         ~~ config ~~
         gactar {
             log_level: 'detail'
             trace_activations: true
             random_seed: 7
         }
         ~~ init ~~
         ~~ productions ~~",
    );
    assert_eq!(model.options.log_level.to_string(), "detail");
    assert!(model.options.trace_activations);
    assert_eq!(model.options.random_seed, Some(7));
}

#[test]
fn gactar_unrecognized_field() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         gactar { foo: bar }
         ~~ init ~~
         ~~ productions ~~",
        "ERROR: unrecognized option \"foo\" in gactar section",
    );
}

#[test]
fn gactar_log_level_must_be_string() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         gactar { log_level: bar }
         ~~ init ~~
         ~~ productions ~~",
        "ERROR: log_level (bar) must be a string",
    );
}

#[test]
fn gactar_log_level_must_be_valid() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         gactar { log_level: 'verbose' }
         ~~ init ~~
         ~~ productions ~~",
        "ERROR: log_level (verbose) must be one of \"min, info, detail\"",
    );
}

#[test]
fn gactar_trace_activations_must_be_bool() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         gactar { trace_activations: 6.0 }
         ~~ init ~~
         ~~ productions ~~",
        "ERROR: trace_activations (6) must be 'true' or 'false'",
    );
}

#[test]
fn gactar_nested_value_rejected() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         gactar { log_level {} }
         ~~ init ~~
         ~~ productions ~~",
        "ERROR: log_level ({...}) must be a string",
    );
}

// ─── chunks config ─────────────────────────────────────────────────────

#[test]
fn chunk_internal_type_reserved() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [_internal: foo bar] }
         ~~ init ~~
         ~~ productions ~~",
        "ERROR: cannot use reserved chunk type \"_internal\" \
         (chunks beginning with '_' are reserved)",
    );
}

#[test]
fn chunk_reserved_type() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [retrieval: foo bar] }
         ~~ init ~~
         ~~ productions ~~",
        "ERROR: cannot use reserved chunk type \"retrieval\"",
    );
}

#[test]
fn chunk_duplicate_type() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks {
             [something: foo bar]
             [something: foo bar]
         }
         ~~ init ~~
         ~~ productions ~~",
        "ERROR: duplicate chunk type: 'something'",
    );
}

#[test]
fn chunk_duplicate_slot() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [something: foo foo] }
         ~~ init ~~
         ~~ productions ~~",
        "ERROR: duplicate slot name \"foo\" in chunk type 'something'",
    );
}

// ─── modules config ────────────────────────────────────────────────────

#[test]
fn modules_all() {
    let model = assert_clean(
        "~~ model ~~
         name: Test
         ~~ config ~~
         modules {
             imaginal { delay: 0.2 }
             memory {
                 latency_factor: 0.5
                 latency_exponent: 0.75
                 retrieval_threshold: 0.1
                 finst_size: 5
                 finst_time: 2.5
                 decay: 0.6
                 max_spread_strength: 0.9
                 instantaneous_noise: 0.5
                 mismatch_penalty: 1.0
             }
             procedural { default_action_time: 0.06 }
             goal { spreading_activation: 0.5 }
         }
         ~~ init ~~
         ~~ productions ~~",
    );

    let memory = model.memory();
    assert_eq!(memory.latency_factor, Some(0.5));
    assert_eq!(memory.finst_size, Some(5));
    assert_eq!(memory.mismatch_penalty, Some(1.0));
    assert_eq!(model.imaginal().unwrap().delay, Some(0.2));
    assert_eq!(model.procedural().default_action_time, Some(0.06));
    assert_eq!(model.goal().spreading_activation, Some(0.5));
}

#[test]
fn modules_unrecognized_module() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         modules { foo { delay: 0.2 } }
         ~~ init ~~
         ~~ productions ~~",
        "ERROR: unrecognized module in config: 'foo'",
    );
}

#[test]
fn modules_unrecognized_option() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         modules { goal { foo: 0.2 } }
         ~~ init ~~
         ~~ productions ~~",
        "ERROR: unrecognized option \"foo\" in goal config",
    );
}

#[test]
fn modules_imaginal_delay_type() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         modules { imaginal { delay: \"gack\" } }
         ~~ init ~~
         ~~ productions ~~",
        "ERROR: imaginal delay 'gack' must be a number",
    );
}

#[test]
fn modules_imaginal_delay_range() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         modules { imaginal { delay: -0.5 } }
         ~~ init ~~
         ~~ productions ~~",
        "ERROR: imaginal delay '-0.500000' must be a positive number",
    );
}

#[test]
fn modules_memory_decay_range() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         modules { memory { decay: 1.5 } }
         ~~ init ~~
         ~~ productions ~~",
        "ERROR: memory decay '1.500000' is out of range (0-1)",
    );
}

#[test]
fn modules_duplicate_option() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         modules {
             imaginal {
                 delay: 0.2
                 delay: 0.3
             }
         }
         ~~ init ~~
         ~~ productions ~~",
        "ERROR: duplicate option \"delay\"",
    );
}

#[test]
fn modules_extra_buffers() {
    let model = assert_clean(
        "~~ model ~~
         name: Test
         ~~ config ~~
         modules {
             extra_buffers {
                 buffer1 {}
                 buffer2 {}
             }
         }
         ~~ init ~~
         ~~ productions ~~",
    );
    assert!(model.has_buffer("buffer1"));
    assert!(model.has_buffer("buffer2"));
}

#[test]
fn modules_extra_buffers_duplicate() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         modules {
             extra_buffers {
                 buffer1 {}
                 buffer1 {}
             }
         }
         ~~ init ~~
         ~~ productions ~~",
        "ERROR: duplicate option \"buffer1\"",
    );
}

#[test]
fn modules_extra_buffers_reserved_name() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         modules { extra_buffers { goal {} } }
         ~~ init ~~
         ~~ productions ~~",
        "ERROR: cannot use reserved buffer name \"goal\"",
    );
}

#[test]
fn modules_spreading_activation_needs_max_spread_strength() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         modules { goal { spreading_activation: 0.5 } }
         ~~ init ~~
         ~~ productions ~~",
        "ERROR: spreading_activation set on buffer \"goal\", \
         but max_spread_strength not set on memory module",
    );
}

// ─── init section ──────────────────────────────────────────────────────

#[test]
fn init_memory_multiple_patterns() {
    let model = assert_clean(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks {
             [remember: person]
             [author: person object]
         }
         ~~ init ~~
         memory {
             [remember: me]
             [author: 'me' 'software']
         }
         ~~ productions ~~",
    );
    assert_eq!(model.initializers.len(), 2);
    // 'me' as a bare identifier becomes an implicit chunk
    assert_eq!(model.implicit_chunks, vec!["me"]);
}

#[test]
fn init_named_chunks() {
    let model = assert_clean(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [author: person object year] }
         ~~ init ~~
         memory {
             bar [author: 'Fred' 'Book' '1972']
             foo [author: 'Jane' 'Book' '1982']
             [author: 'Xe' 'Software' '2001']
         }
         ~~ productions ~~",
    );
    assert_eq!(model.explicit_chunks, vec!["bar", "foo"]);
    assert_eq!(
        model.initializers[0].chunk_name.as_deref(),
        Some("bar")
    );
}

#[test]
fn init_duplicate_chunk_names() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [author: person object year] }
         ~~ init ~~
         memory {
             foo [author: 'Fred' 'Book' '1972']
             foo [author: 'Jane' 'Book' '1982']
         }
         ~~ productions ~~",
        "ERROR: duplicate chunk name \"foo\" found in initialization",
    );
}

#[test]
fn init_slot_count_mismatch() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [author: person object year] }
         ~~ init ~~
         memory { [author: 'me' 'software'] }
         ~~ productions ~~",
        "ERROR: invalid chunk - 'author' expects 3 slots",
    );
}

#[test]
fn init_unknown_chunk() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         ~~ init ~~
         goal [author: 'Fred' 'Book' '1972']
         ~~ productions ~~",
        "ERROR: could not find chunk named 'author'",
    );
}

#[test]
fn init_unknown_module() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [author: person object year] }
         ~~ init ~~
         something [author: 'Fred' 'Book' '1972']
         ~~ productions ~~",
        "ERROR: module 'something' not found in initialization",
    );
}

#[test]
fn init_goal_multiple_patterns() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [author: person object year] }
         ~~ init ~~
         goal { [author: 'Fred' 'Book' '1972'] [author: 'Jane' 'Book' '1982'] }
         ~~ productions ~~",
        "ERROR: module \"goal\" should only have one pattern \
         in initialization of buffer \"goal\"",
    );
}

#[test]
fn init_goal_initialized_twice() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [author: person object year] }
         ~~ init ~~
         goal [author: 'Fred' 'Book' '1972']
         goal [author: 'Jane' 'Book' '1982']
         ~~ productions ~~",
        "ERROR: buffer \"goal\" should only have one initialization",
    );
}

#[test]
fn init_extra_buffers_by_name() {
    let model = assert_clean(
        "~~ model ~~
         name: Test
         ~~ config ~~
         modules {
             extra_buffers {
                 buffer1 {}
                 buffer2 {}
             }
         }
         chunks { [author: person object year] }
         ~~ init ~~
         buffer1 [author: 'Fred' 'Book' '1972']
         buffer2 [author: 'Jane' 'Book' '1984']
         ~~ productions ~~",
    );
    assert_eq!(model.initializers[0].buffer_name, "buffer1");
    assert_eq!(model.initializers[0].module_name, "extra_buffers");
}

#[test]
fn init_module_without_buffers() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [author: person object year] }
         ~~ init ~~
         procedural [author: 'Jane' 'Book' '1984']
         ~~ productions ~~",
        "ERROR: module 'procedural' does not have any buffers",
    );
}

#[test]
fn init_no_variables_allowed() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [author: person object year] }
         ~~ init ~~
         memory { [author: ?who 'Book' '1984'] }
         ~~ productions ~~",
        "ERROR: cannot use a variable in an initializer",
    );
}

#[test]
fn init_no_wildcards_allowed() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [author: person object year] }
         ~~ init ~~
         memory { [author: * 'Book' '1984'] }
         ~~ productions ~~",
        "ERROR: cannot use a wildcard in an initializer",
    );
}

#[test]
fn init_similarities() {
    let model = assert_clean(
        "~~ model ~~
         name: Test
         ~~ config ~~
         modules { memory { mismatch_penalty: 1.0 } }
         chunks { [group: id parent position] }
         ~~ init ~~
         memory {
             [group: group1 list first]
             [group: group2 list second]
         }
         similar {
             ( first second -0.5 )
             ( second third -0.5 )
         }
         ~~ productions ~~",
    );
    assert_eq!(model.similarities.len(), 2);
    // similarity chunk names are implicit chunks
    assert!(model.implicit_chunks.contains(&"third".to_string()));
}

#[test]
fn init_similarity_out_of_range() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         ~~ init ~~
         similar { ( first second 0.5 ) }
         ~~ productions ~~",
        "ERROR: similarity value '0.5' must be between -1 and 0",
    );
}

// ─── productions: matches ──────────────────────────────────────────────

#[test]
fn production_unknown_buffer() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [add: a b] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { another_goal [add: * *] }
             do { print 'foo' }
         }",
        "ERROR: buffer 'another_goal' not found in production 'start'",
    );
}

#[test]
fn production_unknown_chunk() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: error] }
             do { print 42 }
         }",
        "ERROR: could not find chunk named 'foo'",
    );
}

#[test]
fn production_buffer_state() {
    let model = assert_clean(
        "~~ model ~~
         name: Test
         ~~ config ~~
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal is empty }
             do { print 42 }
         }",
    );
    assert_eq!(model.productions.len(), 1);
}

#[test]
fn production_invalid_buffer_state() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal is busy }
             do { print 42 }
         }",
        "ERROR: invalid state 'busy' for buffer 'goal' in production 'start' \
         (should be 'empty' or 'full')",
    );
}

#[test]
fn production_module_state() {
    assert_clean(
        "~~ model ~~
         name: Test
         ~~ config ~~
         ~~ init ~~
         ~~ productions ~~
         start {
             match { memory [_status: error] }
             do { print 42 }
         }",
    );
}

#[test]
fn production_module_state_by_buffer_name() {
    assert_clean(
        "~~ model ~~
         name: Test
         ~~ config ~~
         ~~ init ~~
         ~~ productions ~~
         start {
             match { retrieval [_status: busy] }
             do { print 42 }
         }",
    );
}

#[test]
fn production_invalid_module_state() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         ~~ init ~~
         ~~ productions ~~
         start {
             match { retrieval [_status: something] }
             do { print 42 }
         }",
        "ERROR: invalid _status 'something' for 'retrieval' in production 'start' \
         (should be 'busy' or 'error')",
    );
}

#[test]
fn production_status_slot_count() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         ~~ init ~~
         ~~ productions ~~
         start {
             match { retrieval [_status: busy error] }
             do { print 42 }
         }",
        "ERROR: invalid chunk - '_status' expects 1 slot",
    );
}

// ─── productions: variables ────────────────────────────────────────────

#[test]
fn production_unused_variable() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: ?blat] }
             do { set goal to [foo: ding] }
         }",
        "ERROR: variable ?blat is not used - should be simplified to '*'",
    );
}

#[test]
fn production_variable_unifies_in_one_pattern() {
    assert_clean(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing1 thing2] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: ?blat ?blat] }
             do { set goal to [foo: ding ding] }
         }",
    );
}

#[test]
fn production_negated_wildcard_is_a_parse_error() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing1 thing2] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: ?blat !*] }
             do { print ?blat }
         }",
        "ERROR: unexpected token \"!\" (expected \"]\")",
    );
}

#[test]
fn production_where_clause_counts_as_use() {
    assert_clean(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing1 thing2] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: ?blat *] when ( ?blat != 5 ) }
             do { clear goal }
         }",
    );
}

#[test]
fn production_where_clause_unbound_variable() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing1 thing2] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: ?blat *] when ( ?ding != 5 ) }
             do { print ?blat }
         }",
        "ERROR: where clause variable '?ding' not found in matches \
         for production 'start'",
    );
}

#[test]
fn production_where_clause_compare_to_self() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing1 thing2] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: ?blat *] when ( ?blat == ?blat ) }
             do { print ?blat }
         }",
        "ERROR: variable '?blat' cannot be compared to itself in production 'start'",
    );
}

#[test]
fn production_where_clause_on_negated_variable() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing1 thing2] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: * !?blat] when ( ?blat != 5 ) }
             do { clear goal }
         }",
        "ERROR: cannot constrain negated variable",
    );
}

// ─── productions: statements ───────────────────────────────────────────

#[test]
fn production_clear_unknown_buffer() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: 'blat'] }
             do { clear some_buffer }
         }",
        "ERROR: buffer 'some_buffer' not found in production 'start'",
    );
}

#[test]
fn production_set_unknown_buffer() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: 'blat'] }
             do { set foo.bar to 'blat' }
         }",
        "ERROR: buffer \"foo\" not found in model",
    );
}

#[test]
fn production_set_unmatched_buffer() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         modules { imaginal { delay: 0.2 } }
         chunks { [foo: thing] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: 'blat'] }
             do { set imaginal.bar to 'blat' }
         }",
        "ERROR: match buffer 'imaginal' not found in production 'start'",
    );
}

#[test]
fn production_set_unknown_slot() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: 'blat'] }
             do { set goal.bar to 'blat' }
         }",
        "ERROR: slot 'bar' does not exist in chunk type 'foo' \
         for match buffer 'goal' in production 'start'",
    );
}

#[test]
fn production_set_slot_to_unbound_variable() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: 'blat'] }
             do { set goal.thing to ?ding }
         }",
        "ERROR: set statement variable '?ding' not found in matches \
         for production 'start'",
    );
}

#[test]
fn production_set_pattern_with_unbound_variable() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: 'blat'] }
             do { set goal to [foo: ?ding] }
         }",
        "ERROR: set statement variable '?ding' not found in matches \
         for production 'start'",
    );
}

#[test]
fn production_set_buffer_to_scalar() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: 'blat'] }
             do { set goal to 6 }
         }",
        "ERROR: buffer 'goal' must be set to a pattern in production 'start'",
    );
}

#[test]
fn production_set_slot_to_pattern() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: 'blat'] }
             do { set goal.thing to [foo: 'ding'] }
         }",
        "ERROR: cannot set a slot ('goal.thing') to a pattern in production 'start'",
    );
}

#[test]
fn production_set_nil_and_merging() {
    let model = assert_clean(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing1 thing2] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: 'blat' *] }
             do {
                 set goal.thing1 to nil
                 set goal.thing2 to 'done'
             }
         }",
    );

    // the two slot sets merge into one statement
    let statements = &model.productions[0].do_statements;
    assert_eq!(statements.len(), 1);
    match &statements[0] {
        gactar::model::Statement::Set(set) => {
            assert_eq!(set.slots.len(), 2);
            assert_eq!(set.slots[0].index, 1);
            assert_eq!(set.slots[1].index, 2);
        }
        other => panic!("expected set statement, got {other:?}"),
    }
}

#[test]
fn production_multiple_recall() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing1 thing2] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: ?next *] }
             do {
                 recall [foo: ?next *]
                 recall [foo: * ?next]
             }
         }",
        "ERROR: only one recall statement per production is allowed \
         in production 'start'",
    );
}

#[test]
fn production_recall_slot_count() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing1 thing2] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: ?next *] }
             do { recall [foo: ?next * 'bar'] }
         }",
        "ERROR: invalid chunk - 'foo' expects 2 slots",
    );
}

#[test]
fn production_recall_unbound_variable() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing] [bar: other thing] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: 'blat'] }
             do { recall [bar: ?next *] }
         }",
        "ERROR: recall statement variable '?next' not found in matches \
         for production 'start'",
    );
}

#[test]
fn production_recall_with_params() {
    let model = assert_clean(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing1 thing2] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: ?next *] }
             do { recall [foo: ?next *] with ( recently_retrieved: nil ) }
         }",
    );

    match &model.productions[0].do_statements[0] {
        gactar::model::Statement::Recall { request_params, .. } => {
            assert_eq!(
                request_params,
                &[("recently_retrieved".to_string(), "nil".to_string())]
            );
        }
        other => panic!("expected recall, got {other:?}"),
    }
}

#[test]
fn production_recall_with_unknown_param() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing1 thing2] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: ?next *] }
             do { recall [foo: ?next *] with ( foo_param: 42 ) }
         }",
        "ERROR: recall 'with': unrecognized option \"foo_param\"",
    );
}

#[test]
fn production_recall_with_invalid_value() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing1 thing2] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: ?next *] }
             do { recall [foo: ?next *] with ( recently_retrieved: 'bar' ) }
         }",
        "ERROR: recall 'with': must be one of \"t, nil, reset\"",
    );
}

#[test]
fn production_print_arguments() {
    assert_clean(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing1 thing2] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: * ?other] }
             do { print 42, ?other, 'blat' }
         }",
    );
}

#[test]
fn production_print_without_arguments() {
    assert_clean(
        "~~ model ~~
         name: Test
         ~~ config ~~
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal is empty }
             do { print }
         }",
    );
}

#[test]
fn production_print_bare_identifier() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         ~~ init ~~
         ~~ productions ~~
         start {
             match { retrieval [_status: error] }
             do { print fooID }
         }",
        "ERROR: cannot use ID 'fooID' in print statement",
    );
}

#[test]
fn production_print_nil() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal is empty }
             do { print nil }
         }",
        "ERROR: cannot use nil in print statement",
    );
}

#[test]
fn production_print_wildcard_is_a_parse_error() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         ~~ init ~~
         ~~ productions ~~
         start {
             match { retrieval [_status: error] }
             do { print * }
         }",
        "ERROR: unexpected token \"*\" (expected \"}\")",
    );
}

#[test]
fn production_print_unbound_variable() {
    assert_error(
        "~~ model ~~
         name: Test
         ~~ config ~~
         ~~ init ~~
         ~~ productions ~~
         start {
             match { retrieval [_status: error] }
             do { print ?fooVar }
         }",
        "ERROR: print statement variable '?fooVar' not found in matches \
         for production 'start'",
    );
}

// ─── multiple statements together ──────────────────────────────────────

#[test]
fn production_multiple_statements() {
    let model = assert_clean(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing1 thing2] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match { goal [foo: ?next ?other] }
             do {
                 recall [foo: ?next *]
                 set goal to [foo: ?other 42]
             }
         }",
    );
    assert_eq!(model.productions[0].do_statements.len(), 2);
}

#[test]
fn variable_index_uses_first_binding() {
    let model = assert_clean(
        "~~ model ~~
         name: Test
         ~~ config ~~
         chunks { [foo: thing1 thing2] }
         ~~ init ~~
         ~~ productions ~~
         start {
             match {
                 goal [foo: ?x *]
                 retrieval [foo: ?x ?y]
             }
             do { print ?x, ?y }
         }",
    );

    let indexes = &model.productions[0].var_indexes;
    assert_eq!(indexes["x"].buffer_name, "goal");
    assert_eq!(indexes["x"].slot_name, "thing1");
    assert_eq!(indexes["y"].buffer_name, "retrieval");
    assert_eq!(indexes["y"].slot_name, "thing2");
}
