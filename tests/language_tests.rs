// Integration tests for the sort-script language

use algoviz::executor::execute;

fn logs(source: &str) -> Vec<String> {
    let outcome = execute(source, &[]);
    assert!(outcome.is_success(), "Execution failed: {:?}", outcome.error);
    outcome.logs
}

#[test]
fn test_recursive_merge_sort() {
    let source = r#"
        function sort(data, snapshot) {
            function merge(left, right) {
                const out = [];
                let i = 0;
                let j = 0;
                while (i < left.length && j < right.length) {
                    if (left[i] <= right[j]) {
                        out.push(left[i]);
                        i++;
                    } else {
                        out.push(right[j]);
                        j++;
                    }
                }
                while (i < left.length) { out.push(left[i]); i++; }
                while (j < right.length) { out.push(right[j]); j++; }
                return out;
            }

            function mergeSort(arr) {
                if (arr.length <= 1) return arr;
                const mid = Math.floor(arr.length / 2);
                return merge(mergeSort(arr.slice(0, mid)), mergeSort(arr.slice(mid)));
            }

            const sorted = mergeSort(data);
            for (let k = 0; k < sorted.length; k++) {
                data[k] = sorted[k];
                snapshot([...data], [k], `Placed ${sorted[k]}`);
            }
        }
    "#;

    let outcome = execute(source, &[5.0, 1.0, 4.0, 2.0, 3.0]);
    let steps = outcome.result().expect("merge sort failed");
    assert_eq!(steps.len(), 5);
    assert_eq!(steps.last().unwrap().array, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(steps.get(0).unwrap().description, "Placed 1");
}

#[test]
fn test_destructuring_swap_in_bubble_pass() {
    let source = r#"
        function sort(data, snapshot) {
            for (let i = 0; i < data.length - 1; i++) {
                if (data[i] > data[i + 1]) {
                    [data[i], data[i + 1]] = [data[i + 1], data[i]];
                    snapshot(data, [i, i + 1]);
                }
            }
        }
    "#;

    let outcome = execute(source, &[3.0, 1.0, 2.0]);
    let steps = outcome.result().expect("swap failed");
    assert_eq!(steps.len(), 2);
    assert_eq!(steps.get(0).unwrap().array, vec![1.0, 3.0, 2.0]);
    assert_eq!(steps.get(1).unwrap().array, vec![1.0, 2.0, 3.0]);
    assert_eq!(steps.get(1).unwrap().description, "");
}

#[test]
fn test_number_formatting() {
    let out = logs("console.log(0.1 + 0.2, 1 / 0, 7 / 2, -0, 10 % 3);");
    assert_eq!(out, vec!["0.30000000000000004 Infinity 3.5 0 1"]);
}

#[test]
fn test_arrays_print_like_join() {
    let out = logs("const a = [1, [2, 3], null]; console.log(a, a.length, `${a}`);");
    assert_eq!(out, vec!["1,2,3, 3 1,2,3,"]);
}

#[test]
fn test_arrow_functions_and_closures() {
    let out = logs(
        "const add = (a, b) => a + b;\n\
         function counter() { let c = 0; return () => { c++; return c; }; }\n\
         const next = counter();\n\
         next();\n\
         console.log(add(2, 3), next());",
    );
    assert_eq!(out, vec!["5 2"]);
}

#[test]
fn test_loop_control_flow() {
    let out = logs(
        "let total = 0;\n\
         for (let i = 0; i < 10; i++) {\n\
           if (i % 2 === 0) continue;\n\
           if (i > 7) break;\n\
           total += i;\n\
         }\n\
         let n = 0;\n\
         do { n++; } while (n < 3);\n\
         console.log(total, n);",
    );
    assert_eq!(out, vec!["16 3"]);
}

#[test]
fn test_console_levels_are_prefixed() {
    let out = logs("console.log('a'); console.warn('b'); console.error('c'); console.info('d');");
    assert_eq!(out, vec!["a", "WARN: b", "ERROR: c", "d"]);
}

#[test]
fn test_runtime_error_keeps_earlier_logs() {
    let outcome = execute(
        "function sort(data, snapshot) {\n  console.log('before');\n  missing();\n}",
        &[1.0],
    );
    assert!(outcome.steps.is_empty());
    assert_eq!(outcome.logs, vec!["before"]);
    let err = outcome.error.unwrap();
    assert_eq!(err.to_string(), "ReferenceError: missing is not defined");
    assert_eq!(err.location().map(|loc| loc.line), Some(3));
}

#[test]
fn test_const_reassignment_is_rejected() {
    let outcome = execute("const x = 1;\nx = 2;", &[]);
    let err = outcome.error.expect("expected a TypeError");
    assert!(err.to_string().starts_with("TypeError: Assignment to constant variable 'x'"));
    assert_eq!(err.location().map(|loc| loc.line), Some(2));
}
