//! Integration tests for selector parsing: grammar productions, node
//! shapes, and the error taxonomy.

use wallaby_dom::Tag;
use wallaby_selectors::selector::{
    AttributeOp, AttributeSelector, BinaryOp, TextOp, TextSelector, UnaryOp,
};
use wallaby_selectors::{Selector, SelectorError, SelectorTree, parse_selector};

fn parse(input: &str) -> SelectorTree {
    parse_selector(input, false).expect("selector should parse")
}

fn parse_err(input: &str) -> SelectorError {
    parse_selector(input, false).expect_err("selector should be rejected")
}

#[test]
fn test_parse_universal_selector() {
    let tree = parse("*");
    assert!(matches!(tree.root().as_ref(), Selector::Dummy));
}

#[test]
fn test_parse_type_selector() {
    let tree = parse("div");
    assert!(matches!(tree.root().as_ref(), Selector::Tag(Tag::Div)));

    // Tag names are lowercase-normalized at parse time.
    let tree = parse("DIV");
    assert!(matches!(tree.root().as_ref(), Selector::Tag(Tag::Div)));
}

#[test]
fn test_class_selector_compiles_to_includes_on_class() {
    let tree = parse(".highlight");
    let Selector::Attribute(attr) = tree.root().as_ref() else {
        panic!("expected attribute selector");
    };
    assert_eq!(attr.op(), AttributeOp::Includes);
    assert_eq!(attr.name(), "class");
    assert_eq!(attr.value(), Some("highlight"));
}

#[test]
fn test_id_selector_compiles_to_equals_on_id() {
    let tree = parse("#main");
    let Selector::Attribute(attr) = tree.root().as_ref() else {
        panic!("expected attribute selector");
    };
    assert_eq!(attr.op(), AttributeOp::Equals);
    assert_eq!(attr.name(), "id");
    assert_eq!(attr.value(), Some("main"));
}

#[test]
fn test_compound_selector_folds_with_intersection() {
    // div.foo => Intersection(Tag(div), Includes(class, foo))
    let tree = parse("div.foo");
    let Selector::Binary {
        op: BinaryOp::Intersection,
        left,
        right,
    } = tree.root().as_ref()
    else {
        panic!("expected intersection");
    };
    assert!(matches!(left.as_ref(), Selector::Tag(Tag::Div)));
    let Selector::Attribute(attr) = right.as_ref() else {
        panic!("expected attribute selector");
    };
    assert_eq!(attr.op(), AttributeOp::Includes);
}

#[test]
fn test_combinator_symbols() {
    for (input, expected) in [
        ("a b", BinaryOp::Descendant),
        ("a > b", BinaryOp::Child),
        ("a + b", BinaryOp::Adjacent),
        ("a ~ b", BinaryOp::Sibling),
        ("a>b", BinaryOp::Child),
        ("a+b", BinaryOp::Adjacent),
        ("a~b", BinaryOp::Sibling),
    ] {
        let tree = parse(input);
        let Selector::Binary { op, left, right } = tree.root().as_ref() else {
            panic!("expected binary combinator for {input:?}");
        };
        assert_eq!(*op, expected, "combinator for {input:?}");
        assert!(matches!(left.as_ref(), Selector::Tag(Tag::A)));
        assert!(matches!(right.as_ref(), Selector::Tag(Tag::B)));
    }
}

#[test]
fn test_asymmetric_combinator_spacing_is_rejected() {
    assert!(matches!(parse_err("a> b"), SelectorError::Syntax { .. }));
    assert!(matches!(parse_err("a >b"), SelectorError::Syntax { .. }));
}

#[test]
fn test_selector_group_folds_with_union() {
    let tree = parse("a, b");
    let Selector::Binary {
        op: BinaryOp::Union,
        left,
        right,
    } = tree.root().as_ref()
    else {
        panic!("expected union");
    };
    assert!(matches!(left.as_ref(), Selector::Tag(Tag::A)));
    assert!(matches!(right.as_ref(), Selector::Tag(Tag::B)));
}

#[test]
fn test_unqualified_pseudo_class_is_wrapped_with_dummy() {
    let tree = parse(":first-child");
    let Selector::Binary {
        op: BinaryOp::Intersection,
        left,
        right,
    } = tree.root().as_ref()
    else {
        panic!("expected Dummy wrapping");
    };
    assert!(matches!(left.as_ref(), Selector::Dummy));
    let Selector::Nth(nth) = right.as_ref() else {
        panic!("expected structural selector");
    };
    assert_eq!((nth.step, nth.offset), (0, 1));
    assert!(!nth.from_last);
    assert!(!nth.of_type);
}

#[test]
fn test_qualified_pseudo_class_is_not_dummy_wrapped() {
    let tree = parse("li:first-child");
    let Selector::Binary {
        op: BinaryOp::Intersection,
        left,
        ..
    } = tree.root().as_ref()
    else {
        panic!("expected intersection");
    };
    assert!(matches!(left.as_ref(), Selector::Tag(Tag::Li)));
}

fn parse_nth(input: &str) -> (i32, i32, bool, bool) {
    let tree = parse(input);
    let Selector::Binary { right, .. } = tree.root().as_ref() else {
        panic!("expected Dummy wrapping for {input:?}");
    };
    let Selector::Nth(nth) = right.as_ref() else {
        panic!("expected structural selector for {input:?}");
    };
    (nth.step, nth.offset, nth.from_last, nth.of_type)
}

#[test]
fn test_nth_expression_forms() {
    assert_eq!(parse_nth(":nth-child(odd)"), (2, 1, false, false));
    assert_eq!(parse_nth(":nth-child(even)"), (2, 0, false, false));
    assert_eq!(parse_nth(":nth-child(5)"), (0, 5, false, false));
    assert_eq!(parse_nth(":nth-child(n)"), (1, 0, false, false));
    assert_eq!(parse_nth(":nth-child(n+2)"), (1, 2, false, false));
    assert_eq!(parse_nth(":nth-child(2n+1)"), (2, 1, false, false));
    assert_eq!(parse_nth(":nth-child(3n)"), (3, 0, false, false));
    assert_eq!(parse_nth(":nth-child(2n-1)"), (2, -1, false, false));
    // Bare sign coefficient means step +-1.
    assert_eq!(parse_nth(":nth-child(-n+3)"), (-1, 3, false, false));
    assert_eq!(parse_nth(":nth-child(+n-1)"), (1, -1, false, false));
    // Whitespace inside the parens is stripped, case is folded.
    assert_eq!(parse_nth(":nth-child( 2N + 1 )"), (2, 1, false, false));
    assert_eq!(parse_nth(":nth-child(ODD)"), (2, 1, false, false));
}

#[test]
fn test_nth_family_flags() {
    assert_eq!(parse_nth(":nth-last-child(2)"), (0, 2, true, false));
    assert_eq!(parse_nth(":nth-of-type(2n)"), (2, 0, false, true));
    assert_eq!(parse_nth(":nth-last-of-type(3)"), (0, 3, true, true));
    assert_eq!(parse_nth(":last-child"), (0, 1, true, false));
    assert_eq!(parse_nth(":first-of-type"), (0, 1, false, true));
    assert_eq!(parse_nth(":last-of-type"), (0, 1, true, true));
}

#[test]
fn test_malformed_nth_expressions_are_rejected() {
    assert!(matches!(
        parse_err(":nth-child()"),
        SelectorError::Syntax { .. }
    ));
    assert!(matches!(
        parse_err(":nth-child(2n+1x)"),
        SelectorError::Syntax { .. }
    ));
    assert!(matches!(
        parse_err(":nth-child(x)"),
        SelectorError::Syntax { .. }
    ));
    assert!(matches!(
        parse_err(":nth-child(2n1)"),
        SelectorError::Syntax { .. }
    ));
    assert!(matches!(
        parse_err(":nth-child(2n+1"),
        SelectorError::Syntax { .. }
    ));
}

#[test]
fn test_singleton_and_empty_pseudo_classes() {
    let tree = parse(":only-child");
    let Selector::Binary { right, .. } = tree.root().as_ref() else {
        panic!("expected Dummy wrapping");
    };
    assert!(matches!(right.as_ref(), Selector::Only { of_type: false }));

    let tree = parse(":only-of-type");
    let Selector::Binary { right, .. } = tree.root().as_ref() else {
        panic!("expected Dummy wrapping");
    };
    assert!(matches!(right.as_ref(), Selector::Only { of_type: true }));

    let tree = parse("div:empty");
    let Selector::Binary { right, .. } = tree.root().as_ref() else {
        panic!("expected intersection");
    };
    assert!(matches!(right.as_ref(), Selector::Empty));
}

#[test]
fn test_unary_pseudo_classes() {
    for (input, expected) in [
        (":not(p)", UnaryOp::Not),
        (":has(p)", UnaryOp::HasDescendant),
        (":haschild(p)", UnaryOp::HasChild),
    ] {
        let tree = parse(input);
        let Selector::Binary { right, .. } = tree.root().as_ref() else {
            panic!("expected Dummy wrapping for {input:?}");
        };
        let Selector::Unary { op, inner } = right.as_ref() else {
            panic!("expected unary selector for {input:?}");
        };
        assert_eq!(*op, expected);
        assert!(matches!(inner.as_ref(), Selector::Tag(Tag::P)));
    }
}

#[test]
fn test_not_accepts_a_nested_selector_group() {
    let tree = parse(":not(a, b > c)");
    let Selector::Binary { right, .. } = tree.root().as_ref() else {
        panic!("expected Dummy wrapping");
    };
    let Selector::Unary {
        op: UnaryOp::Not,
        inner,
    } = right.as_ref()
    else {
        panic!("expected :not");
    };
    assert!(matches!(
        inner.as_ref(),
        Selector::Binary {
            op: BinaryOp::Union,
            ..
        }
    ));
}

#[test]
fn test_text_pseudo_classes() {
    for (input, expected) in [
        (":contains(hello)", TextOp::Contains),
        (":containsown('hello')", TextOp::ContainsOwn),
        (":matches(\"hello\")", TextOp::Matches),
        (":matchesown(hello)", TextOp::MatchesOwn),
    ] {
        let tree = parse(input);
        let Selector::Binary { right, .. } = tree.root().as_ref() else {
            panic!("expected Dummy wrapping for {input:?}");
        };
        let Selector::Text(text) = right.as_ref() else {
            panic!("expected text selector for {input:?}");
        };
        assert_eq!(text.op(), expected);
        assert_eq!(text.needle(), "hello");
    }
}

#[test]
fn test_unknown_pseudo_class_is_a_hard_error() {
    let err = parse_err("a:hover");
    let SelectorError::Syntax { message, .. } = err else {
        panic!("expected syntax error");
    };
    assert!(message.contains("unknown pseudo-class"));
}

#[test]
fn test_attribute_operator_forms() {
    for (input, expected) in [
        ("[href]", AttributeOp::Exists),
        ("[x=y]", AttributeOp::Equals),
        ("[x~=y]", AttributeOp::Includes),
        ("[x|=y]", AttributeOp::DashMatch),
        ("[x^=y]", AttributeOp::PrefixMatch),
        ("[x$=y]", AttributeOp::SuffixMatch),
        ("[x*=y]", AttributeOp::SubstringMatch),
    ] {
        let tree = parse(input);
        let Selector::Attribute(attr) = tree.root().as_ref() else {
            panic!("expected attribute selector for {input:?}");
        };
        assert_eq!(attr.op(), expected, "operator for {input:?}");
        if expected == AttributeOp::Exists {
            assert_eq!(attr.value(), None);
        } else {
            assert_eq!(attr.value(), Some("y"));
        }
    }
}

#[test]
fn test_attribute_values_accept_both_quote_styles() {
    for input in ["[title='hi there']", "[title=\"hi there\"]"] {
        let tree = parse(input);
        let Selector::Attribute(attr) = tree.root().as_ref() else {
            panic!("expected attribute selector");
        };
        assert_eq!(attr.value(), Some("hi there"));
    }
}

#[test]
fn test_escaped_quote_keeps_backslash_in_value() {
    // [title="say \"hi\""] -- the scan passes escaped quotes but does not
    // unescape, so the extracted value keeps the backslashes.
    let tree = parse("[title=\"say \\\"hi\\\"\"]");
    let Selector::Attribute(attr) = tree.root().as_ref() else {
        panic!("expected attribute selector");
    };
    assert_eq!(attr.value(), Some("say \\\"hi\\\""));
}

#[test]
fn test_prefix_attribute_name_matching_is_rejected() {
    let err = parse_err("[^data]");
    let SelectorError::Syntax { message, .. } = err else {
        panic!("expected syntax error");
    };
    assert!(message.contains("not supported"));
}

#[test]
fn test_string_literal_errors() {
    // Unterminated string.
    assert!(matches!(
        parse_err("[x=\"abc]"),
        SelectorError::Syntax { .. }
    ));
    // Empty string immediately after the opening quote.
    assert!(matches!(parse_err("[x=\"\"]"), SelectorError::Syntax { .. }));
}

#[test]
fn test_unbalanced_brackets_and_parens_are_rejected() {
    assert!(matches!(parse_err("[x=y"), SelectorError::Syntax { .. }));
    assert!(matches!(parse_err(":not(p"), SelectorError::Syntax { .. }));
    assert!(matches!(
        parse_err(":contains('x'"),
        SelectorError::Syntax { .. }
    ));
}

#[test]
fn test_unconsumed_trailing_input_is_rejected() {
    let err = parse_err("div!");
    let SelectorError::Syntax { remaining, .. } = err else {
        panic!("expected syntax error");
    };
    assert_eq!(remaining, "!");

    // A leading `*` is standalone and terminates the sequence, so a
    // trailing qualifier is left unconsumed.
    assert!(matches!(parse_err("*.foo"), SelectorError::Syntax { .. }));
}

#[test]
fn test_empty_and_blank_input_are_rejected() {
    assert!(matches!(parse_err(""), SelectorError::Syntax { .. }));
    assert!(matches!(parse_err("   "), SelectorError::Syntax { .. }));
    assert!(matches!(parse_err("a, "), SelectorError::Syntax { .. }));
}

#[test]
fn test_attribute_selector_construction_rejects_empty_name() {
    let err = AttributeSelector::new(AttributeOp::Equals, "", Some("x".to_string()))
        .expect_err("empty attribute name should be rejected");
    assert!(matches!(err, SelectorError::Construction(_)));
}

#[test]
fn test_attribute_selector_construction_requires_a_value() {
    let err = AttributeSelector::new(AttributeOp::Equals, "href", None)
        .expect_err("missing value should be rejected");
    assert!(matches!(err, SelectorError::Construction(_)));

    let err = AttributeSelector::new(AttributeOp::Includes, "class", Some(String::new()))
        .expect_err("empty value should be rejected");
    assert!(matches!(err, SelectorError::Construction(_)));

    // Presence tests carry no value at all.
    assert!(AttributeSelector::new(AttributeOp::Exists, "href", None).is_ok());
}

#[test]
fn test_text_selector_construction_rejects_empty_string() {
    let err = TextSelector::new(TextOp::Contains, "")
        .expect_err("empty search string should be rejected");
    assert!(matches!(err, SelectorError::Construction(_)));
}

#[test]
fn test_identifier_escape_mechanisms() {
    // HTML character references are copied through verbatim.
    let tree = parse(".caf&eacute;");
    let Selector::Attribute(attr) = tree.root().as_ref() else {
        panic!("expected attribute selector");
    };
    assert_eq!(attr.value(), Some("caf&eacute;"));

    // Backslash escapes are consumed through the terminating delimiter.
    let tree = parse(".a\\:b");
    let Selector::Attribute(attr) = tree.root().as_ref() else {
        panic!("expected attribute selector");
    };
    assert_eq!(attr.value(), Some("a\\:b"));
}

#[test]
fn test_source_retention_is_opt_in() {
    let with = parse_selector("div > p", true).expect("should parse");
    assert_eq!(with.source(), Some("div > p"));

    let without = parse_selector("div > p", false).expect("should parse");
    assert_eq!(without.source(), None);
}

#[test]
fn test_parsing_is_idempotent() {
    let first = parse("div.foo > p:nth-child(2n+1), a[href^=http]");
    let second = parse("div.foo > p:nth-child(2n+1), a[href^=http]");
    assert_eq!(first.root(), second.root());
}

#[test]
fn test_left_associative_combinator_chain() {
    // "a > b p" groups as Descendant(Child(a, b), p).
    let tree = parse("a > b p");
    let Selector::Binary {
        op: BinaryOp::Descendant,
        left,
        right,
    } = tree.root().as_ref()
    else {
        panic!("expected descendant at the top");
    };
    assert!(matches!(right.as_ref(), Selector::Tag(Tag::P)));
    assert!(matches!(
        left.as_ref(),
        Selector::Binary {
            op: BinaryOp::Child,
            ..
        }
    ));
}
