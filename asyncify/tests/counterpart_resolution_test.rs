//! Matching rules of the counterpart resolver: suffix and overload naming,
//! parameter and return-shape compatibility, inherited search, visibility,
//! and memoization.
#![allow(clippy::unwrap_used)]

use asyncify::counterpart::{CounterpartOptions, CounterpartResolver};
use asyncify::model::{
    FunctionSignature, Parameter, ReturnShape, SymbolTable, TypeParam, TypeRef, Visibility,
};
use asyncify::Config;

fn resolver() -> CounterpartResolver {
    CounterpartResolver::new(&Config::default())
}

fn string_ty() -> TypeRef {
    TypeRef::named("string")
}

#[test]
fn finds_suffixed_counterpart() {
    let mut table = SymbolTable::new();
    let file = table.add_type("File");
    let read = table.add_function(FunctionSignature::new(
        "Read",
        file,
        vec![Parameter::value("path", string_ty())],
        ReturnShape::Value(string_ty()),
    ));
    table.add_function(FunctionSignature::new(
        "ReadAsync",
        file,
        vec![Parameter::value("path", string_ty())],
        ReturnShape::wrapped(string_ty()),
    ));

    let found = resolver().find_counterparts(&table, read, file, CounterpartOptions::default());
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "ReadAsync");
    assert!(!found[0].synthetic);
    assert_eq!(found[0].param_count, 1);
}

#[test]
fn missing_counterpart_is_an_empty_result_not_an_error() {
    let mut table = SymbolTable::new();
    let file = table.add_type("File");
    let read = table.add_function(FunctionSignature::new(
        "Read",
        file,
        vec![],
        ReturnShape::Void,
    ));

    let found = resolver().find_counterparts(&table, read, file, CounterpartOptions::default());
    assert!(found.is_empty());
}

#[test]
fn trailing_cancellation_token_is_accepted() {
    let mut table = SymbolTable::new();
    let file = table.add_type("File");
    let read = table.add_function(FunctionSignature::new(
        "Read",
        file,
        vec![Parameter::value("path", string_ty())],
        ReturnShape::Value(string_ty()),
    ));
    table.add_function(FunctionSignature::new(
        "ReadAsync",
        file,
        vec![
            Parameter::value("path", string_ty()),
            Parameter::value("token", TypeRef::named("CancellationToken")),
        ],
        ReturnShape::wrapped(string_ty()),
    ));

    let found = resolver().find_counterparts(&table, read, file, CounterpartOptions::default());
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].param_count, 2);

    let strict = CounterpartOptions {
        accepts_cancellation: false,
        ..CounterpartOptions::default()
    };
    let found = resolver().find_counterparts(&table, read, file, strict);
    assert!(found.is_empty(), "extra token must be rejected when disabled");
}

#[test]
fn parameter_optionality_must_match_exactly() {
    let mut table = SymbolTable::new();
    let file = table.add_type("File");
    let read = table.add_function(FunctionSignature::new(
        "Read",
        file,
        vec![Parameter::value("path", string_ty())],
        ReturnShape::Value(string_ty()),
    ));
    table.add_function(FunctionSignature::new(
        "ReadAsync",
        file,
        vec![Parameter::value("path", string_ty()).optional()],
        ReturnShape::wrapped(string_ty()),
    ));

    let found = resolver().find_counterparts(&table, read, file, CounterpartOptions::default());
    assert!(found.is_empty());
}

#[test]
fn void_maps_only_to_the_bare_wrapper() {
    let mut table = SymbolTable::new();
    let file = table.add_type("File");
    let flush = table.add_function(FunctionSignature::new(
        "Flush",
        file,
        vec![],
        ReturnShape::Void,
    ));
    // Wrong: wrapper-of(string) for a void original.
    table.add_function(FunctionSignature::new(
        "FlushAsync",
        file,
        vec![],
        ReturnShape::wrapped(string_ty()),
    ));

    let found = resolver().find_counterparts(&table, flush, file, CounterpartOptions::default());
    assert!(found.is_empty());

    let mut table = SymbolTable::new();
    let file = table.add_type("File");
    let flush = table.add_function(FunctionSignature::new(
        "Flush",
        file,
        vec![],
        ReturnShape::Void,
    ));
    table.add_function(FunctionSignature::new(
        "FlushAsync",
        file,
        vec![],
        ReturnShape::Wrapped(None),
    ));

    let found = resolver().find_counterparts(&table, flush, file, CounterpartOptions::default());
    assert_eq!(found.len(), 1);
}

#[test]
fn plain_callback_matches_wrapper_returning_callback() {
    let mut table = SymbolTable::new();
    let runner = table.add_type("Runner");
    let each = table.add_function(FunctionSignature::new(
        "Each",
        runner,
        vec![Parameter::value(
            "action",
            TypeRef::delegate(vec![string_ty()], ReturnShape::Void),
        )],
        ReturnShape::Void,
    ));
    table.add_function(FunctionSignature::new(
        "EachAsync",
        runner,
        vec![Parameter::value(
            "action",
            TypeRef::delegate(vec![string_ty()], ReturnShape::Wrapped(None)),
        )],
        ReturnShape::Wrapped(None),
    ));

    let found = resolver().find_counterparts(&table, each, runner, CounterpartOptions::default());
    assert_eq!(found.len(), 1, "delegate upgrade should match");

    let strict = CounterpartOptions {
        equal_parameters: true,
        ..CounterpartOptions::default()
    };
    let found = resolver().find_counterparts(&table, each, runner, strict);
    assert!(found.is_empty(), "delegate upgrade is off with equal_parameters");
}

#[test]
fn equal_returns_need_an_upgraded_delegate_pair() {
    let mut table = SymbolTable::new();
    let runner = table.add_type("Runner");
    // Callback-style API: the wrapper appears only in the callback.
    let start = table.add_function(FunctionSignature::new(
        "Start",
        runner,
        vec![Parameter::value(
            "done",
            TypeRef::delegate(vec![], ReturnShape::Void),
        )],
        ReturnShape::Void,
    ));
    table.add_function(FunctionSignature::new(
        "StartAsync",
        runner,
        vec![Parameter::value(
            "done",
            TypeRef::delegate(vec![], ReturnShape::Wrapped(None)),
        )],
        ReturnShape::Void,
    ));
    let found = resolver().find_counterparts(&table, start, runner, CounterpartOptions::default());
    assert_eq!(found.len(), 1);

    // Identical signature with an equal return and no upgraded pair is not
    // a counterpart.
    let mut table = SymbolTable::new();
    let runner = table.add_type("Runner");
    let stop = table.add_function(FunctionSignature::new(
        "Stop",
        runner,
        vec![],
        ReturnShape::Void,
    ));
    table.add_function(FunctionSignature::new(
        "StopAsync",
        runner,
        vec![],
        ReturnShape::Void,
    ));
    let found = resolver().find_counterparts(&table, stop, runner, CounterpartOptions::default());
    assert!(found.is_empty());
}

#[test]
fn inherited_counterparts_are_found_and_hidden_ones_discarded() {
    let mut table = SymbolTable::new();
    let base = table.add_type("StreamBase");
    let derived = table.add_type("FileStream");
    table.add_base(derived, base);

    let load = table.add_function(FunctionSignature::new(
        "Load",
        derived,
        vec![],
        ReturnShape::Value(string_ty()),
    ));
    let derived_async = table.add_function(FunctionSignature::new(
        "LoadAsync",
        derived,
        vec![],
        ReturnShape::wrapped(string_ty()),
    ));
    let base_async = table.add_function(
        FunctionSignature::new("LoadAsync", base, vec![], ReturnShape::wrapped(string_ty())),
    );
    table.relate(derived_async, base_async);

    let found = resolver().find_counterparts(&table, load, derived, CounterpartOptions::default());
    assert_eq!(found.len(), 1, "base declaration is hidden by the override");
    assert_eq!(found[0].sig, derived_async);

    let local_only = CounterpartOptions {
        search_inherited: false,
        ..CounterpartOptions::default()
    };
    let found = resolver().find_counterparts(&table, load, derived, local_only);
    assert_eq!(found.len(), 1);
}

#[test]
fn base_only_counterpart_requires_inherited_search() {
    let mut table = SymbolTable::new();
    let base = table.add_type("StreamBase");
    let derived = table.add_type("FileStream");
    table.add_base(derived, base);

    let load = table.add_function(FunctionSignature::new(
        "Load",
        derived,
        vec![],
        ReturnShape::Value(string_ty()),
    ));
    table.add_function(FunctionSignature::new(
        "LoadAsync",
        base,
        vec![],
        ReturnShape::wrapped(string_ty()),
    ));

    let found = resolver().find_counterparts(&table, load, derived, CounterpartOptions::default());
    assert_eq!(found.len(), 1);

    let local_only = CounterpartOptions {
        search_inherited: false,
        ..CounterpartOptions::default()
    };
    let found = resolver().find_counterparts(&table, load, derived, local_only);
    assert!(found.is_empty());
}

#[test]
fn private_counterparts_are_visible_only_from_the_declaring_type() {
    let mut table = SymbolTable::new();
    let file = table.add_type("File");
    let other = table.add_type("Caller");
    let read = table.add_function(FunctionSignature::new(
        "Read",
        file,
        vec![],
        ReturnShape::Value(string_ty()),
    ));
    table.add_function(
        FunctionSignature::new("ReadAsync", file, vec![], ReturnShape::wrapped(string_ty()))
            .with_visibility(Visibility::Private),
    );

    let from_outside =
        resolver().find_counterparts(&table, read, other, CounterpartOptions::default());
    assert!(from_outside.is_empty());

    let from_inside =
        resolver().find_counterparts(&table, read, file, CounterpartOptions::default());
    assert_eq!(from_inside.len(), 1);
}

#[test]
fn same_name_overload_needs_the_option() {
    let mut table = SymbolTable::new();
    let file = table.add_type("File");
    let read = table.add_function(FunctionSignature::new(
        "Read",
        file,
        vec![Parameter::value("path", string_ty())],
        ReturnShape::Value(string_ty()),
    ));
    table.add_function(FunctionSignature::new(
        "Read",
        file,
        vec![
            Parameter::value("path", string_ty()),
            Parameter::value("token", TypeRef::named("CancellationToken")),
        ],
        ReturnShape::wrapped(string_ty()),
    ));

    let found = resolver().find_counterparts(&table, read, file, CounterpartOptions::default());
    assert!(found.is_empty());

    let relaxed = CounterpartOptions {
        allow_same_name: true,
        ..CounterpartOptions::default()
    };
    let found = resolver().find_counterparts(&table, read, file, relaxed);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Read");
}

#[test]
fn type_parameter_lists_compare_positionally() {
    let mut table = SymbolTable::new();
    let repo = table.add_type("Repo");
    let get = table.add_function(
        FunctionSignature::new("Get", repo, vec![], ReturnShape::Value(TypeRef::Param("T".into())))
            .with_type_params(vec![TypeParam::new("T").constrained("IEntity")]),
    );
    table.add_function(
        FunctionSignature::new(
            "GetAsync",
            repo,
            vec![],
            ReturnShape::wrapped(TypeRef::Param("U".into())),
        )
        .with_type_params(vec![TypeParam::new("U").constrained("IEntity")]),
    );

    let found = resolver().find_counterparts(&table, get, repo, CounterpartOptions::default());
    assert_eq!(found.len(), 1, "names differ but constraints match");

    let mut table = SymbolTable::new();
    let repo = table.add_type("Repo");
    let get = table.add_function(
        FunctionSignature::new("Get", repo, vec![], ReturnShape::Value(TypeRef::Param("T".into())))
            .with_type_params(vec![TypeParam::new("T").constrained("IEntity")]),
    );
    table.add_function(
        FunctionSignature::new(
            "GetAsync",
            repo,
            vec![],
            ReturnShape::wrapped(TypeRef::Param("T".into())),
        )
        .with_type_params(vec![TypeParam::new("T").constrained("ICloneable")]),
    );

    let found = resolver().find_counterparts(&table, get, repo, CounterpartOptions::default());
    assert!(found.is_empty(), "constraint sets differ");
}

#[test]
fn repeated_lookups_hit_the_cache() {
    let mut table = SymbolTable::new();
    let file = table.add_type("File");
    let read = table.add_function(FunctionSignature::new(
        "Read",
        file,
        vec![],
        ReturnShape::Value(string_ty()),
    ));
    table.add_function(FunctionSignature::new(
        "ReadAsync",
        file,
        vec![],
        ReturnShape::wrapped(string_ty()),
    ));

    let resolver = resolver();
    let first = resolver.find_counterparts(&table, read, file, CounterpartOptions::default());
    let second = resolver.find_counterparts(&table, read, file, CounterpartOptions::default());
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}
