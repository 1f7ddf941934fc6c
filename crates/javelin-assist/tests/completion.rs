use javelin_assist::{
    parse_for_completion, AssistError, CompletionResult, LocalOrigin, MarkerKind, ParseMode,
    ScopeKind, NONE,
};
use pretty_assertions::assert_eq;

const CARET: &str = "<|>";

/// Parse `marked` with the caret at `<|>`.
fn complete(marked: &str, mode: ParseMode) -> CompletionResult {
    let caret = marked
        .find(CARET)
        .unwrap_or_else(|| panic!("missing {CARET} in {marked:?}"));
    let source = marked.replacen(CARET, "", 1);
    parse_for_completion(&source, caret, mode)
        .unwrap_or_else(|err| panic!("completion failed for {marked:?}: {err}"))
}

struct Case {
    source: &'static str,
    mode: ParseMode,
    marker: &'static str,
    parent: &'static str,
}

#[track_caller]
fn check(case: &Case) {
    let result = complete(case.source, case.mode);
    assert_eq!(result.marker_string(), case.marker, "marker of {:?}", case.source);
    assert_eq!(result.parent_string(), case.parent, "parent of {:?}", case.source);
}

#[test]
fn method_body_expressions() {
    const BODY: ParseMode = ParseMode::Method;
    let cases = [
        Case {
            source: "class A { void f() { foo().ba<|>",
            mode: BODY,
            marker: "<CompleteOnMemberAccess:foo().ba>",
            parent: NONE,
        },
        Case {
            source: "class A { void f() { int x = a + b.c<|>",
            mode: BODY,
            marker: "<CompleteOnName:b.c>",
            parent: "a + <CompleteOnName:b.c>",
        },
        Case {
            source: "class A { void f() { if (cou<|>",
            mode: BODY,
            marker: "<CompleteOnName:cou>",
            parent: NONE,
        },
        Case {
            source: "class A { int f() { return val<|>",
            mode: BODY,
            marker: "<CompleteOnName:val>",
            parent: "return <CompleteOnName:val>;",
        },
        Case {
            source: "class A { void f() { ret<|>",
            mode: BODY,
            marker: "<CompleteOnName:ret>",
            parent: NONE,
        },
        Case {
            source: "class A { void f() { Object o = new ArrayList<>(<|>",
            mode: BODY,
            marker: "<CompleteOnAllocationExpression:new ArrayList<>()>",
            parent: "Object o = <CompleteOnAllocationExpression:new ArrayList<>()>;",
        },
        Case {
            source: "class A { void f() { new Foo(a, <|>",
            mode: BODY,
            marker: "<CompleteOnAllocationExpression:new Foo(a)>",
            parent: NONE,
        },
        Case {
            source: "class A { void f() { foo(a, <|>",
            mode: BODY,
            marker: "<CompleteOnMessageSend:foo(a)>",
            parent: NONE,
        },
        Case {
            source: "class A { void f() { list.add(x, y + 1, <|>",
            mode: BODY,
            marker: "<CompleteOnMessageSend:list.add(x, y + 1)>",
            parent: NONE,
        },
        Case {
            source: "class A { void f() { bar(new Foo(a, <|>",
            mode: BODY,
            marker: "<CompleteOnAllocationExpression:new Foo(a)>",
            parent: "bar(<CompleteOnAllocationExpression:new Foo(a)>)",
        },
        Case {
            source: "class A { void f() { throw new IllegalArg<|>",
            mode: BODY,
            marker: "<CompleteOnException:IllegalArg>",
            parent: "new <CompleteOnException:IllegalArg>()",
        },
        Case {
            source: "class A { void f() { String na<|>",
            mode: BODY,
            marker: "<CompleteOnLocalName:na>",
            parent: NONE,
        },
        Case {
            source: "class A { void f() { try { } catch (IOExc<|>",
            mode: BODY,
            marker: "<CompleteOnException:IOExc>",
            parent: NONE,
        },
    ];
    for case in &cases {
        check(case);
    }
}

#[test]
fn member_and_header_positions() {
    let cases = [
        Case {
            source: "class A implements java.util.Li<|>",
            mode: ParseMode::Diet,
            marker: "<CompleteOnType:java.util.Li>",
            parent: NONE,
        },
        Case {
            source: "class A { void f() throws IOExc<|>",
            mode: ParseMode::Diet,
            marker: "<CompleteOnException:IOExc>",
            parent: NONE,
        },
        Case {
            source: "class A { String na<|>",
            mode: ParseMode::Diet,
            marker: "<CompleteOnFieldName:na>",
            parent: NONE,
        },
        Case {
            source: "class A { Str<|>",
            mode: ParseMode::Diet,
            marker: "<CompleteOnType:Str>",
            parent: NONE,
        },
        Case {
            source: "class A { void f(String na<|>",
            mode: ParseMode::Diet,
            marker: "<CompleteOnArgumentName:na>",
            parent: NONE,
        },
        Case {
            source: "class X ext<|>",
            mode: ParseMode::Diet,
            marker: "<CompleteOnKeyword:ext>",
            parent: NONE,
        },
        Case {
            source: "class X extends Y imp<|>",
            mode: ParseMode::Diet,
            marker: "<CompleteOnKeyword:imp>",
            parent: NONE,
        },
    ];
    for case in &cases {
        check(case);
    }
}

#[test]
fn header_keyword_slot_keeps_the_declaration() {
    let result = complete("class X ext<|>", ParseMode::Diet);
    assert_eq!(
        result.unit_string(),
        "class X extends <CompleteOnKeyword:ext> {\n  X() {\n  }\n}\n"
    );
    assert_eq!(result.synthesized().default_constructors, 1);
}

#[test]
fn package_and_import_names() {
    let result = complete("package com.ex<|>", ParseMode::Diet);
    assert_eq!(result.marker_string(), "<CompleteOnPackage:com.ex>");
    assert_eq!(result.unit_string(), "package <CompleteOnPackage:com.ex>;\n");

    let result = complete("import java.util.Arr<|>", ParseMode::Diet);
    assert_eq!(result.marker_string(), "<CompleteOnImport:java.util.Arr>");

    let result = complete("import java.<|>", ParseMode::Diet);
    assert_eq!(result.marker_string(), "<CompleteOnImport:java.>");
    assert_eq!(result.replaced_source(), Some("java."));
}

#[test]
fn top_level_keyword_fragment_becomes_an_import() {
    let result = complete("abst<|>", ParseMode::Diet);
    assert_eq!(result.marker_string(), "<CompleteOnKeyword:abst>");
    assert_eq!(result.unit_string(), "import <CompleteOnKeyword:abst>;\n");
    assert_eq!(result.parent_string(), NONE);
    assert!(result.synthesized().keyword_import);
}

#[test]
fn identifier_after_unknown_type_name_is_not_completed() {
    let result = complete("X ext<|>", ParseMode::Diet);
    assert_eq!(result.marker_string(), NONE);
    assert_eq!(result.unit_string(), "");
    assert_eq!(result.marker_kind(), None);
}

#[test]
fn lambda_parameters_are_in_scope() {
    let result = complete(
        "class A {
  void foo() {
    goo((first, second) -> { return (xyz, pqr) -> first.<|>",
        ParseMode::Method,
    );
    assert_eq!(result.marker_string(), "<CompleteOnName:first.>");
    assert_eq!(
        result.parent_string(),
        "(<no type> xyz, <no type> pqr) -> <CompleteOnName:first.>"
    );
    assert_eq!(result.replaced_source(), Some("first."));
    assert_eq!(result.scope(), Some(ScopeKind::Lambda));
    let names: Vec<_> = result
        .visible_locals()
        .iter()
        .map(|local| local.name.as_str())
        .collect();
    assert_eq!(names, vec!["pqr", "xyz", "second", "first"]);
    assert!(result
        .visible_locals()
        .iter()
        .all(|local| local.origin == LocalOrigin::LambdaParameter && local.ty.is_none()));
}

#[test]
fn member_access_replaces_the_whole_chain() {
    for (marked, replaced, identifier) in [
        ("class A { void f() { foo().ba<|>", "foo().ba", "ba"),
        ("class A { void f() { this.x<|>", "this.x", "x"),
        ("class A { void f() { a.b().c.<|>", "a.b().c.", ""),
    ] {
        let result = complete(marked, ParseMode::Method);
        assert_eq!(
            result.marker_kind(),
            Some(MarkerKind::CompleteOnMemberAccess),
            "{marked}"
        );
        assert_eq!(result.identifier(), Some(identifier), "{marked}");
        assert_eq!(result.replaced_source(), Some(replaced), "{marked}");
    }
}

#[test]
fn method_reference_in_argument() {
    let result = complete(
        "class A {
  void sort(List<Person> people) {
    people.sort(Comparator.comparing(Person::get<|>",
        ParseMode::Method,
    );
    assert_eq!(
        result.marker_string(),
        "<CompletionOnReferenceExpressionName:Person::get>"
    );
    assert_eq!(result.replaced_source(), Some("Person::get"));
    assert_eq!(
        result.parent_string(),
        "Comparator.comparing(<CompletionOnReferenceExpressionName:Person::get>)"
    );
}

#[test]
fn open_call_replaces_nothing() {
    let source = "class A { void f() { list.add(";
    let result = parse_for_completion(source, source.len(), ParseMode::Method).unwrap();
    assert_eq!(result.marker_string(), "<CompleteOnMessageSend:list.add()>");
    assert_eq!(result.marker_kind(), Some(MarkerKind::CompleteOnMessageSend));
    assert_eq!(result.identifier(), Some(""));
    assert_eq!(result.replaced_source(), Some(""));
    let replaced = result.replaced_range().unwrap();
    assert_eq!(replaced.start, replaced.end);
}

#[test]
fn malformed_declarator_chain_recovers_as_separate_locals() {
    let result = complete("class A { void f() { I i = () -> 1, i.<|>;", ParseMode::Method);
    assert_eq!(result.marker_string(), "<CompleteOnName:>");
    assert_eq!(result.identifier(), Some(""));
    assert_eq!(result.replaced_source(), Some(""));
    let unit = result.unit_string();
    assert!(
        unit.contains("    I i = () -> 1;\n    I i;\n    <CompleteOnName:>;\n"),
        "{unit}"
    );
    assert!(result.synthesized().discarded_tokens >= 1);
}

#[test]
fn switch_labels_and_unclosed_groups() {
    let result = complete("class A { void f(int k) { switch (k) { case MA<|>", ParseMode::Method);
    assert_eq!(result.marker_string(), "<CompleteOnName:MA>");
    assert_eq!(result.scope(), Some(ScopeKind::Switch));
    assert_eq!(result.parent_string(), NONE);
    assert_eq!(result.synthesized().anonymous_blocks, 0);

    let result = complete(
        "class A { void f(int k) { switch (k) { case 1: foo(); ba<|>",
        ParseMode::Method,
    );
    assert_eq!(result.marker_string(), "<CompleteOnName:ba>");
    assert_eq!(result.synthesized().anonymous_blocks, 1);
    let unit = result.unit_string();
    assert!(
        unit.contains("    {\n      foo();\n      <CompleteOnName:ba>;\n    }"),
        "{unit}"
    );
}

#[test]
fn unclosed_try_keeps_resources_in_scope() {
    let result = complete(
        "class A { void f() { try (var in = open()) { in.<|>",
        ParseMode::Method,
    );
    assert_eq!(result.marker_string(), "<CompleteOnName:in.>");
    let local = &result.visible_locals()[0];
    assert_eq!(local.name, "in");
    assert_eq!(local.ty.as_deref(), Some("var"));
    assert_eq!(local.origin, LocalOrigin::Resource);
    assert_eq!(result.synthesized().anonymous_blocks, 1);
}

#[test]
fn static_state_gets_a_class_initializer() {
    let result = complete("class A { static int count; Str<|>", ParseMode::Diet);
    let unit = result.unit_string();
    let clinit = unit.find("<clinit>() {\n  }").expect("clinit printed");
    let ctor = unit.find("A() {\n  }").expect("constructor printed");
    let field = unit.find("static int count;").expect("field printed");
    assert!(field < clinit && clinit < ctor, "{unit}");
    assert_eq!(result.synthesized().clinits, 1);
    assert_eq!(result.synthesized().default_constructors, 1);
}

#[test]
fn enum_constants_print_before_members() {
    let result = complete("enum E { A, B; Str<|>", ParseMode::Diet);
    let unit = result.unit_string();
    let order = ["A,", "B,", "<CompleteOnType:Str>;", "<clinit>() {", "private E() {"];
    let positions: Vec<_> = order
        .iter()
        .map(|needle| unit.find(needle).unwrap_or_else(|| panic!("{needle} in {unit}")))
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]), "{unit}");
}

#[test]
fn diet_mode_skips_method_bodies() {
    let source = "class A { void f() { fo<|>";
    assert_eq!(complete(source, ParseMode::Diet).marker_string(), NONE);
    assert_eq!(
        complete(source, ParseMode::Method).marker_string(),
        "<CompleteOnName:fo>"
    );
}

#[test]
fn diet_mode_still_parses_field_initializers() {
    let cases = [
        Case {
            source: "class A { int x = fo<|>",
            mode: ParseMode::Diet,
            marker: "<CompleteOnName:fo>",
            parent: "int x = <CompleteOnName:fo>;",
        },
        Case {
            source: "class A { Object o = foo(<|>",
            mode: ParseMode::Diet,
            marker: "<CompleteOnMessageSend:foo()>",
            parent: "Object o = <CompleteOnMessageSend:foo()>;",
        },
    ];
    for case in &cases {
        check(case);
    }
}

#[test]
fn no_marker_inside_comments_or_strings() {
    for source in [
        "class A { // fo<|>",
        "class A { /* fo<|> */ }",
        "class A { String s = \"fo<|>",
    ] {
        let result = complete(source, ParseMode::Method);
        assert_eq!(result.marker_string(), NONE, "{source:?}");
        assert_eq!(result.replaced_range(), None);
    }
}

#[test]
fn invalid_offsets_are_rejected() {
    assert_eq!(
        parse_for_completion("abc", 4, ParseMode::Diet).unwrap_err(),
        AssistError::OffsetOutOfBounds { offset: 4, len: 3 }
    );
    assert_eq!(
        parse_for_completion("é", 1, ParseMode::Diet).unwrap_err(),
        AssistError::NotCharBoundary { offset: 1 }
    );
}

#[test]
fn summary_serializes_to_json() {
    let result = complete("class A { void f() { list.si<|>", ParseMode::Method);
    let json = serde_json::to_value(result.summary()).unwrap();
    assert_eq!(json["marker"], "<CompleteOnName:list.si>");
    assert_eq!(json["identifier"], "si");
    assert_eq!(json["scope"], "method");
}
