use javelin_assist::{
    parse_for_completion, parse_for_completion_with_options, parse_for_selection, AssistOptions,
    AssistResult, ParseMode,
};
use pretty_assertions::assert_eq;

const BODY: &str = "class A { void f() { ";
const TOO_DEEP: &str = "nesting too deep";

/// Stack for the parsing thread, well below the default test thread size.
const SMALL_STACK: usize = 1024 * 1024;

struct Deep {
    name: &'static str,
    source: String,
}

fn deep_inputs() -> Vec<Deep> {
    let body = |repeated: &str, times: usize| format!("{BODY}{}", repeated.repeat(times));
    vec![
        Deep {
            name: "nested types",
            source: format!("class A {{ {}", "class B { ".repeat(1000)),
        },
        Deep {
            name: "array accesses",
            source: body("a[", 1000),
        },
        Deep {
            name: "assignments",
            source: body("x = ", 3000),
        },
        Deep {
            name: "additions",
            source: body("a + ", 3000),
        },
        Deep {
            name: "type arguments",
            source: format!("class A {{ {}", "List<".repeat(3000)),
        },
        Deep {
            name: "blocks",
            source: body("{", 3000),
        },
        Deep {
            name: "call chain",
            source: body("a.b(c).", 1000),
        },
        Deep {
            name: "lambdas around try blocks",
            source: body("a(b -> { try { ", 500),
        },
        Deep {
            name: "allocations",
            source: body("new Foo(", 1000),
        },
        Deep {
            name: "array initializers",
            source: format!("class A {{ int[] x = {}", "{".repeat(3000)),
        },
        Deep {
            name: "parentheses",
            source: body("(", 3000),
        },
        Deep {
            name: "casts",
            source: body("(T) -", 2000),
        },
        Deep {
            name: "else-if chain",
            source: body("if (a) x(); else ", 2000),
        },
    ]
}

/// Run `f` on a thread with a small stack.
fn on_small_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    std::thread::Builder::new()
        .stack_size(SMALL_STACK)
        .spawn(f)
        .expect("spawn parser thread")
        .join()
        .expect("parser thread panicked")
}

/// Print everything a client would look at, so the tree walks run as well.
fn render(result: &AssistResult) -> (String, String, String) {
    (
        result.marker_string(),
        result.parent_string(),
        result.unit_string(),
    )
}

#[test]
fn deep_nesting_ends_in_a_result() {
    for deep in deep_inputs() {
        let Deep { name, source } = deep;
        let errors = on_small_stack(move || {
            let mut messages = Vec::new();
            for mode in [ParseMode::Method, ParseMode::Diet] {
                let result = parse_for_completion(&source, source.len(), mode)
                    .unwrap_or_else(|err| panic!("{name}: {err}"));
                render(&result);
                messages.extend(result.errors().iter().map(|e| e.message.clone()));
            }
            let result = parse_for_selection(&source, BODY.len(), source.len())
                .unwrap_or_else(|err| panic!("{name}: {err}"));
            render(&result);
            messages
        });
        assert!(
            errors.iter().any(|message| message == TOO_DEEP),
            "{name}: expected a depth error, got {errors:?}"
        );
    }
}

#[test]
fn depth_limit_is_configurable() {
    let options = AssistOptions {
        mode: ParseMode::Method,
        max_depth: 8,
    };
    let source = format!("{BODY}{}fo", "{".repeat(20));
    let result = parse_for_completion_with_options(&source, source.len(), options).unwrap();
    render(&result);
    assert!(result.errors().iter().any(|e| e.message == TOO_DEEP));

    let source = format!("{BODY}int x = {}1;", "a + ".repeat(50));
    let result = parse_for_completion_with_options(&source, source.len(), options).unwrap();
    render(&result);
    assert!(result.errors().iter().any(|e| e.message == TOO_DEEP));

    let source = format!("{BODY}int x = a + b + c; fo");
    let result = parse_for_completion_with_options(&source, source.len(), options).unwrap();
    assert_eq!(result.marker_string(), "<CompleteOnName:fo>");
    assert!(result.errors().iter().all(|e| e.message != TOO_DEEP));
}

#[test]
fn markers_inside_the_limit_survive_deep_nesting() {
    let source = format!("{BODY}{}fo", "{".repeat(100));
    let result = parse_for_completion(&source, source.len(), ParseMode::Method).unwrap();
    assert_eq!(result.marker_string(), "<CompleteOnName:fo>");

    let source = format!("{BODY}x = {}fo", "(".repeat(100));
    let result = parse_for_completion(&source, source.len(), ParseMode::Method).unwrap();
    assert_eq!(result.marker_string(), "<CompleteOnName:fo>");

    let source = format!("{BODY}{}a.fo", "a(b -> { try { ".repeat(20));
    let result = parse_for_completion(&source, source.len(), ParseMode::Method).unwrap();
    assert_eq!(result.marker_string(), "<CompleteOnName:a.fo>");
    assert!(result.errors().iter().all(|e| e.message != TOO_DEEP));
}

#[test]
fn long_flat_bodies_do_not_count_as_nesting() {
    let source = format!("{BODY}{}fo", "x = 1; foo(a, b); ".repeat(2000));
    let result = parse_for_completion(&source, source.len(), ParseMode::Method).unwrap();
    assert_eq!(result.marker_string(), "<CompleteOnName:fo>");
    assert!(result.errors().iter().all(|e| e.message != TOO_DEEP));

    let source = format!("class A {{ {}String na", "int x; void f() {} ".repeat(2000));
    let result = parse_for_completion(&source, source.len(), ParseMode::Diet).unwrap();
    assert_eq!(result.marker_string(), "<CompleteOnFieldName:na>");
}
