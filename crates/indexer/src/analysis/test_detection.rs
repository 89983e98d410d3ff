//! Test callable detection
//!
//! A callable counts as test code when either
//! - it carries a test annotation (`@Test`, `@ParameterizedTest`, `@RepeatedTest`,
//!   `@TestFactory`), or
//! - it lives in a test source file and its name starts with `test`.
//!
//! Test source files are recognized by directory (`src/test/`, `test/`, `tests/`,
//! `__tests__/`) or by file name (`*Test.java`, `*_test.*`, `*.test.*`, `*.spec.*`).

const TEST_ANNOTATIONS: [&str; 4] = ["Test", "ParameterizedTest", "RepeatedTest", "TestFactory"];

const TEST_DIRECTORIES: [&str; 3] = ["test", "tests", "__tests__"];

pub fn has_test_annotation(annotations: &[String]) -> bool {
    annotations.iter().any(|annotation| {
        let bare = annotation.trim_start_matches('@');
        // `@org.junit.jupiter.api.Test` and `@Test(expected = ...)` both count
        let bare = bare.split('(').next().unwrap_or(bare);
        let simple = bare.rsplit('.').next().unwrap_or(bare).trim();
        TEST_ANNOTATIONS.contains(&simple)
    })
}

pub fn is_test_path(file_path: &str) -> bool {
    let normalized = file_path.replace('\\', "/");
    let mut segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
    let Some(file_name) = segments.pop() else {
        return false;
    };

    if segments.iter().any(|dir| TEST_DIRECTORIES.contains(dir)) {
        return true;
    }

    file_name.ends_with("Test.java")
        || file_name.contains("_test.")
        || file_name.contains(".test.")
        || file_name.contains(".spec.")
}

pub fn is_test_callable(name: &str, file_path: &str, annotations: &[String]) -> bool {
    if has_test_annotation(annotations) {
        return true;
    }
    is_test_path(file_path) && name.to_ascii_lowercase().starts_with("test")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotations(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_annotations_mark_tests_anywhere() {
        assert!(is_test_callable("shipsOrder", "src/main/Order.java", &annotations(&["@Test"])));
        assert!(is_test_callable(
            "cases",
            "src/main/Order.java",
            &annotations(&["@org.junit.jupiter.params.ParameterizedTest"])
        ));
        assert!(is_test_callable("x", "a.java", &annotations(&["RepeatedTest(3)"])));
        assert!(!is_test_callable("x", "a.java", &annotations(&["@Override"])));
    }

    #[test]
    fn test_test_paths() {
        assert!(is_test_path("src/test/java/com/acme/OrderTest.java"));
        assert!(is_test_path("tests/integration.rs"));
        assert!(is_test_path("web/__tests__/cart.js"));
        assert!(is_test_path("pkg/order_test.go"));
        assert!(is_test_path("web/cart.test.ts"));
        assert!(is_test_path("web/cart.spec.tsx"));
        assert!(is_test_path("src/OrderTest.java"));
        assert!(!is_test_path("src/main/java/com/acme/Order.java"));
        assert!(!is_test_path("src/contest/Entry.java"));
    }

    #[test]
    fn test_name_prefix_only_counts_in_test_files() {
        assert!(is_test_callable("testCheckout", "src/test/CartTest.java", &[]));
        assert!(is_test_callable("test_checkout", "tests/test_cart.py", &[]));
        assert!(!is_test_callable("checkout", "src/test/CartTest.java", &[]));
        assert!(!is_test_callable("testCheckout", "src/main/Cart.java", &[]));
    }
}
