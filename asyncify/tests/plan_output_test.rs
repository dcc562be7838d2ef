//! Shape of the frozen plan: JSON serialization, summary counts, and
//! diagnostic rendering.
#![allow(clippy::unwrap_used)]

use asyncify::model::{
    Expr, FunctionDecl, FunctionSignature, ReturnShape, SourceLoc, Stmt, SymbolTable, TypeRef,
};
use asyncify::Asyncify;
use serde_json::json;

fn model() -> (SymbolTable, Vec<FunctionDecl>) {
    let mut table = SymbolTable::new();
    let io = table.add_type("Io");
    let read = table.add_function(FunctionSignature::new(
        "Read",
        io,
        vec![],
        ReturnShape::Value(TypeRef::named("string")),
    ));
    table.add_function(FunctionSignature::new(
        "ReadAsync",
        io,
        vec![],
        ReturnShape::wrapped(TypeRef::named("string")),
    ));
    let f = table.add_function(FunctionSignature::new(
        "Fn",
        io,
        vec![],
        ReturnShape::Value(TypeRef::named("string")),
    ));
    let decls = vec![FunctionDecl::new(
        f,
        vec![Stmt::Return(Some(Expr::call(read, vec![], SourceLoc(42))))],
    )];
    (table, decls)
}

#[test]
fn plan_serializes_to_the_documented_shape() {
    let (table, decls) = model();
    let outcome = Asyncify::default().analyze(&table, decls).unwrap();

    let value = serde_json::to_value(&outcome.plan).unwrap();
    assert_eq!(
        value,
        json!({
            "functions": [{
                "name": "Io.Fn",
                "decision": "ToAsync",
                "policy": {
                    "omit_async": true,
                    "wrap_in_try_catch": false,
                    "split_tail": false,
                    "preserve_return_type": false,
                    "cancellation_required": false,
                    "rewrite_yields": false
                },
                "preconditions": 0,
                "references": [{
                    "target": "Io.Read",
                    "usage": "DirectInvocation",
                    "loc": 42,
                    "bound_counterpart": "ReadAsync",
                    "candidates": ["ReadAsync"],
                    "await_needed": false,
                    "continuation_argument": false,
                    "last_statement": true,
                    "used_as_return_value": true,
                    "forward_cancellation": false,
                    "ignored": null
                }]
            }]
        })
    );
}

#[test]
fn to_json_is_parseable() {
    let (table, decls) = model();
    let outcome = Asyncify::default().analyze(&table, decls).unwrap();
    let text = outcome.plan.to_json().unwrap();
    let round: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(round["functions"][0]["name"], "Io.Fn");
}

#[test]
fn summary_counts_functions_and_references() {
    let (table, decls) = model();
    let outcome = Asyncify::default().analyze(&table, decls).unwrap();
    let s = &outcome.summary;
    assert_eq!(s.functions, 1);
    assert_eq!(s.converted, 1);
    assert_eq!(s.ignored, 0);
    assert_eq!(s.references, 1);
    assert_eq!(s.ignored_references, 0);
    assert_eq!(s.diagnostics, 0);
}

#[test]
fn unsupported_usage_diagnostics_render_with_location() {
    let mut table = SymbolTable::new();
    let app = table.add_type("App");
    let worker = table.add_function(FunctionSignature::new(
        "Work",
        app,
        vec![],
        ReturnShape::Void,
    ));
    let holder = table.add_function(FunctionSignature::new(
        "Hold",
        app,
        vec![],
        ReturnShape::Void,
    ));
    let decls = vec![FunctionDecl::new(
        holder,
        vec![Stmt::Local {
            name: "callback".into(),
            value: Some(Expr::func_ref(worker, SourceLoc(7))),
        }],
    )];

    let outcome = Asyncify::default().analyze(&table, decls).unwrap();
    assert_eq!(outcome.diagnostics.len(), 1);
    let rendered = outcome.diagnostics[0].render();
    assert!(rendered.contains("App.Hold"));
    assert!(rendered.contains("App.Work"));
    assert!(rendered.contains('7'));
    assert_eq!(outcome.summary.diagnostics, 1);
    assert_eq!(outcome.summary.ignored_references, 1);
}
