use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::ast::*;
use crate::{lex, print_expr, print_marker, print_parent, print_type, print_unit};
use crate::{Lexer, ParseMode, SyntaxKind, TextRange, KEYWORDS};

fn dump_non_trivia(input: &str) -> Vec<(SyntaxKind, String)> {
    lex(input)
        .into_iter()
        .filter(|t| !t.kind.is_trivia())
        .map(|t| (t.kind, t.text(input).to_string()))
        .collect()
}

fn kinds(input: &str) -> Vec<SyntaxKind> {
    dump_non_trivia(input).into_iter().map(|(kind, _)| kind).collect()
}

#[test]
fn lexes_declaration_with_keywords_and_literals() {
    let tokens = dump_non_trivia("public static long x = 0x1FL + 'c';");
    assert_eq!(
        tokens,
        vec![
            (SyntaxKind::PublicKw, "public".into()),
            (SyntaxKind::StaticKw, "static".into()),
            (SyntaxKind::LongKw, "long".into()),
            (SyntaxKind::Identifier, "x".into()),
            (SyntaxKind::Eq, "=".into()),
            (SyntaxKind::LongLiteral, "0x1FL".into()),
            (SyntaxKind::Plus, "+".into()),
            (SyntaxKind::CharLiteral, "'c'".into()),
            (SyntaxKind::Semicolon, ";".into()),
            (SyntaxKind::Eof, "".into()),
        ]
    );
}

#[test]
fn greater_than_is_never_fused() {
    assert_eq!(
        kinds("a >>>= b >> c"),
        vec![
            SyntaxKind::Identifier,
            SyntaxKind::Greater,
            SyntaxKind::Greater,
            SyntaxKind::GreaterEq,
            SyntaxKind::Identifier,
            SyntaxKind::Greater,
            SyntaxKind::Greater,
            SyntaxKind::Identifier,
            SyntaxKind::Eof,
        ]
    );
    assert_eq!(
        kinds("List<List<String>>"),
        vec![
            SyntaxKind::Identifier,
            SyntaxKind::Less,
            SyntaxKind::Identifier,
            SyntaxKind::Less,
            SyntaxKind::Identifier,
            SyntaxKind::Greater,
            SyntaxKind::Greater,
            SyntaxKind::Eof,
        ]
    );
}

#[test]
fn non_sealed_is_one_token_only_when_standalone() {
    assert_eq!(kinds("non-sealed")[0], SyntaxKind::NonSealedKw);
    assert_eq!(
        kinds("non-sealedX"),
        vec![
            SyntaxKind::Identifier,
            SyntaxKind::Minus,
            SyntaxKind::Identifier,
            SyntaxKind::Eof
        ]
    );
}

#[test]
fn numbers() {
    assert_eq!(kinds("1.5")[0], SyntaxKind::DoubleLiteral);
    assert_eq!(kinds("1e10f")[0], SyntaxKind::FloatLiteral);
    assert_eq!(kinds(".5")[0], SyntaxKind::DoubleLiteral);
    assert_eq!(kinds("0b1010")[0], SyntaxKind::IntLiteral);
    // `1e` without digits stays an int followed by an identifier.
    assert_eq!(
        kinds("1e"),
        vec![SyntaxKind::IntLiteral, SyntaxKind::Identifier, SyntaxKind::Eof]
    );
}

#[test]
fn unterminated_literals_and_comments() {
    assert_eq!(kinds("\"abc\nx")[0], SyntaxKind::Error);
    assert_eq!(kinds("\"\"\"\ntext")[0], SyntaxKind::Error);
    let tokens = lex("/* open");
    assert_eq!(tokens[0].kind, SyntaxKind::BlockComment);
    assert_eq!(tokens[0].range, TextRange::new(0, 7));
    assert_eq!(lex("/** doc */")[0].kind, SyntaxKind::DocComment);
    assert_eq!(lex("/**/")[0].kind, SyntaxKind::BlockComment);
}

#[test]
fn text_block() {
    let src = "\"\"\"\n  hi \\\"\"\" there\n\"\"\";";
    let tokens = dump_non_trivia(src);
    assert_eq!(tokens[0].0, SyntaxKind::TextBlock);
    assert_eq!(tokens[1].0, SyntaxKind::Semicolon);
}

#[test]
fn lexer_restarts_with_absolute_ranges() {
    let src = "int x = y;";
    let mut lexer = Lexer::starting_at(src, 8);
    let tok = lexer.next_token();
    assert_eq!(tok.kind, SyntaxKind::Identifier);
    assert_eq!(tok.range, TextRange::new(8, 9));

    let src = "aé b";
    // Inside the two-byte `é`: moved back to its start.
    let lexer = Lexer::starting_at(src, 2);
    assert_eq!(lexer.offset(), 1);
}

#[test]
fn unicode_identifiers() {
    assert_eq!(
        dump_non_trivia("naïve $x _y")
            .into_iter()
            .map(|(_, text)| text)
            .collect::<Vec<_>>(),
        vec!["naïve", "$x", "_y", ""]
    );
}

#[test]
fn every_keyword_round_trips_through_from_keyword() {
    for keyword in KEYWORDS {
        let kind = SyntaxKind::from_keyword(keyword)
            .unwrap_or_else(|| panic!("`{keyword}` has no kind"));
        assert!(kind.is_keyword(), "{keyword}: {kind:?}");
        assert_eq!(kinds(keyword)[0], kind, "{keyword}");
    }
    assert_eq!(SyntaxKind::from_keyword("Class"), None);
}

#[test]
fn kind_classification() {
    assert!(SyntaxKind::PublicKw.is_member_only_keyword());
    assert!(!SyntaxKind::FinalKw.is_member_only_keyword());
    assert!(SyntaxKind::RecordKw.is_identifier_like());
    assert!(!SyntaxKind::ClassKw.is_identifier_like());
    assert!(SyntaxKind::NullKw.is_literal());
    assert!(SyntaxKind::ReturnKw.is_statement_keyword());
    assert!(SyntaxKind::LineComment.is_trivia());
}

#[test]
fn parse_mode_from_str_and_display() {
    assert_eq!("Diet".parse::<ParseMode>(), Ok(ParseMode::Diet));
    assert_eq!(" method ".parse::<ParseMode>(), Ok(ParseMode::Method));
    assert!("full".parse::<ParseMode>().is_err());
    assert_eq!(ParseMode::Method.to_string(), "method");
}

#[test]
fn text_range_cover_ignores_none() {
    let a = TextRange::new(2, 4);
    assert_eq!(a.cover(TextRange::NONE), a);
    assert_eq!(TextRange::NONE.cover(a), a);
    assert_eq!(a.cover(TextRange::new(6, 9)), TextRange::new(2, 9));
    assert!(!TextRange::NONE.contains(a));
    assert!(TextRange::new(0, 10).contains(a));
}

// --- Printer ---

fn name_expr(segments: &[&str]) -> Expr {
    Expr::new(
        ExprKind::Name(segments.iter().map(|s| Ident::new(s)).collect()),
        TextRange::NONE,
    )
}

fn name_marker(kind: MarkerKind, qualifier: &[&str], identifier: &str) -> Marker {
    Marker {
        kind,
        payload: MarkerPayload::Name {
            qualifier: qualifier.iter().map(|s| Ident::new(s)).collect(),
        },
        identifier: Ident::new(identifier),
        range: TextRange::NONE,
    }
}

fn generic(name: &str, args: Vec<TypeRef>) -> TypeRef {
    TypeRef::Named {
        segments: vec![TypeSegment {
            name: name.into(),
            args: Some(args),
        }],
        range: TextRange::NONE,
    }
}

#[test]
fn prints_marker_forms() {
    assert_eq!(
        print_marker(&name_marker(MarkerKind::CompleteOnName, &["a", "b"], "c")),
        "<CompleteOnName:a.b.c>"
    );
    assert_eq!(
        print_marker(&name_marker(MarkerKind::CompleteOnName, &["first"], "")),
        "<CompleteOnName:first.>"
    );

    let reference = Marker {
        kind: MarkerKind::CompletionOnReferenceExpressionName,
        payload: MarkerPayload::Receiver(Box::new(name_expr(&["Person"]))),
        identifier: "get".into(),
        range: TextRange::NONE,
    };
    assert_eq!(
        print_marker(&reference),
        "<CompletionOnReferenceExpressionName:Person::get>"
    );

    let selected = Marker {
        kind: MarkerKind::SelectOnType,
        payload: MarkerPayload::Type(Box::new(generic(
            "Y",
            vec![TypeRef::simple("Object", TextRange::NONE)],
        ))),
        identifier: "Y".into(),
        range: TextRange::NONE,
    };
    assert_eq!(print_marker(&selected), "<SelectOnType:Y<Object>>");

    let send = Marker {
        kind: MarkerKind::CompleteOnMessageSend,
        payload: MarkerPayload::Call {
            receiver: Some(Box::new(name_expr(&["list"]))),
            name: "add".into(),
            args: vec![name_expr(&["x"])],
        },
        identifier: "".into(),
        range: TextRange::NONE,
    };
    assert_eq!(print_marker(&send), "<CompleteOnMessageSend:list.add(x)>");

    let alloc = Marker {
        kind: MarkerKind::CompleteOnAllocationExpression,
        payload: MarkerPayload::Allocation {
            ty: Box::new(generic("ArrayList", Vec::new())),
            args: Vec::new(),
        },
        identifier: "".into(),
        range: TextRange::NONE,
    };
    assert_eq!(
        print_marker(&alloc),
        "<CompleteOnAllocationExpression:new ArrayList<>()>"
    );
}

#[test]
fn prints_types() {
    let map = generic(
        "Map",
        vec![
            TypeRef::simple("String", TextRange::NONE),
            TypeRef::Wildcard {
                bound: Some((
                    WildcardBoundKind::Extends,
                    Box::new(TypeRef::simple("Number", TextRange::NONE)),
                )),
                range: TextRange::NONE,
            },
        ],
    );
    assert_eq!(print_type(&map), "Map<String, ? extends Number>");

    let array = TypeRef::Array {
        elem: Box::new(TypeRef::Primitive {
            name: "int".into(),
            range: TextRange::NONE,
        }),
        dims: 2,
        range: TextRange::NONE,
    };
    assert_eq!(print_type(&array), "int[][]");
    assert_eq!(print_type(&TypeRef::Missing), "$missing$");
}

#[test]
fn prints_lambda_with_untyped_params() {
    let lambda = Expr::new(
        ExprKind::Lambda {
            params: vec![
                LambdaParam {
                    ty: None,
                    name: "xyz".into(),
                },
                LambdaParam {
                    ty: None,
                    name: "pqr".into(),
                },
            ],
            body: LambdaBody::Expr(Box::new(Expr::new(
                ExprKind::Marker(name_marker(MarkerKind::CompleteOnName, &["first"], "")),
                TextRange::NONE,
            ))),
        },
        TextRange::NONE,
    );
    assert_eq!(
        print_expr(&lambda),
        "(<no type> xyz, <no type> pqr) -> <CompleteOnName:first.>"
    );
}

fn method(name: &str, return_ty: Option<TypeRef>, stmts: Vec<Stmt>) -> MethodDecl {
    MethodDecl {
        kind: if return_ty.is_some() {
            MethodKind::Method
        } else {
            MethodKind::Constructor
        },
        modifiers: Modifiers::default(),
        type_params: Vec::new(),
        return_ty,
        name: name.into(),
        params: Vec::new(),
        throws: Vec::new(),
        default_value: None,
        body: Some(Block {
            stmts,
            skipped: false,
            range: TextRange::NONE,
        }),
        range: TextRange::NONE,
    }
}

fn sample_unit() -> CompilationUnit {
    let marker = name_marker(MarkerKind::CompleteOnName, &["list"], "si");
    let local = Stmt {
        kind: StmtKind::LocalVar(LocalVar {
            modifiers: Modifiers::default(),
            ty: TypeRef::Primitive {
                name: "int".into(),
                range: TextRange::NONE,
            },
            name: DeclName::Named("n".into()),
            init: Some(Expr::new(ExprKind::Marker(marker), TextRange::NONE)),
        }),
        range: TextRange::NONE,
    };
    let field = FieldDecl {
        modifiers: Modifiers {
            keywords: vec![Modifier::Private],
            ..Modifiers::default()
        },
        ty: TypeRef::simple("String", TextRange::NONE),
        name: DeclName::Named("name".into()),
        init: None,
        range: TextRange::NONE,
    };
    CompilationUnit {
        package: Some(PackageDecl {
            name: NameOrMarker::Name(QualifiedName {
                segments: vec!["p".into(), "q".into()],
                range: TextRange::NONE,
            }),
            range: TextRange::NONE,
        }),
        imports: vec![ImportDecl {
            is_static: true,
            name: NameOrMarker::Name(QualifiedName {
                segments: vec!["java".into(), "util".into()],
                range: TextRange::NONE,
            }),
            on_demand: true,
            range: TextRange::NONE,
        }],
        types: vec![TypeDecl {
            kind: DeclKind::Class,
            modifiers: Modifiers {
                keywords: vec![Modifier::Public],
                ..Modifiers::default()
            },
            name: "A".into(),
            type_params: Vec::new(),
            record_components: Vec::new(),
            extends: Vec::new(),
            implements: Vec::new(),
            permits: Vec::new(),
            members: vec![
                Member::Method(method("f", Some(TypeRef::simple("void", TextRange::NONE)), vec![local])),
                Member::Field(field),
                Member::Method(method("A", None, Vec::new())),
            ],
            range: TextRange::NONE,
        }],
        range: TextRange::NONE,
    }
}

#[test]
fn prints_unit_with_canonical_layout() {
    let expected = "\
package p.q;
import static java.util.*;
public class A {
  private String name;
  void f() {
    int n = <CompleteOnName:list.si>;
  }
  A() {
  }
}
";
    assert_eq!(print_unit(&sample_unit()), expected);
}

#[test]
fn finds_marker_and_declaration_parent() {
    let unit = sample_unit();
    let marker = find_marker(&unit).expect("marker");
    assert_eq!(marker.identifier, "si");
    let parent = find_marker_parent(&unit).expect("parent");
    assert_eq!(print_parent(parent), "int n = <CompleteOnName:list.si>;");
}

#[test]
fn paren_is_transparent_for_parent_lookup() {
    let marker = Expr::new(
        ExprKind::Marker(name_marker(MarkerKind::CompleteOnName, &[], "x")),
        TextRange::NONE,
    );
    let sum = Expr::new(
        ExprKind::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(name_expr(&["a"])),
            rhs: Box::new(Expr::new(ExprKind::Paren(Box::new(marker)), TextRange::NONE)),
        },
        TextRange::NONE,
    );
    let mut unit = sample_unit();
    let Member::Method(f) = &mut unit.types[0].members[0] else {
        unreachable!()
    };
    f.body = Some(Block {
        stmts: vec![Stmt {
            kind: StmtKind::Expr(sum),
            range: TextRange::NONE,
        }],
        skipped: false,
        range: TextRange::NONE,
    });
    let parent = find_marker_parent(&unit).expect("parent");
    assert_eq!(print_parent(parent), "a + (<CompleteOnName:x>)");
}

#[test]
fn unit_without_marker_has_no_parent() {
    let unit = CompilationUnit::default();
    assert!(find_marker(&unit).is_none());
    assert!(find_marker_parent(&unit).is_none());
    assert_eq!(print_unit(&unit), "");
}

proptest! {
    #[test]
    fn lexer_covers_input_without_gaps(input in "\\PC{0,64}") {
        let tokens = lex(&input);
        let mut offset = 0u32;
        for token in &tokens {
            prop_assert_eq!(token.range.start, offset);
            offset = token.range.end;
        }
        prop_assert_eq!(offset as usize, input.len());
        prop_assert_eq!(tokens.last().map(|t| t.kind), Some(SyntaxKind::Eof));
    }
}
