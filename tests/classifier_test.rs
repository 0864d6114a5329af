use codelang::{Classifier, ClassifierError, Corpus};
use std::sync::Arc;
use std::thread;

fn setup_test_classifier() -> Classifier {
    let (classifier, _) = Classifier::builder()
        .with_corpus(Corpus::demo())
        .build()
        .expect("Failed to train classifier");
    classifier
}

#[test]
fn test_end_to_end_classification() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = setup_test_classifier();

    let (class, scores) = classifier.predict("def hello_world():\n    print('Hello, World!')")?;

    assert_eq!(class, "python");
    assert!(scores.contains_key("python"));
    assert!(scores["python"] > 0.25);
    Ok(())
}

#[test]
fn test_java_keywords_outrank_scripting_languages() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = setup_test_classifier();

    let (class, scores) =
        classifier.predict("public class Main { public static void main(String[] args) {} }")?;

    assert!(class == "java" || class == "cpp", "predicted {}", class);
    let top = scores["java"].max(scores["cpp"]);
    assert!(top > scores["python"]);
    assert!(top > scores["javascript"]);
    Ok(())
}

#[test]
fn test_probabilities_cover_label_set() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = setup_test_classifier();
    let snippets = [
        "const greeting = 'Hello';\nconsole.log(greeting);",
        "#include <iostream>\nstd::cout << \"Hello\" << std::endl;",
        "x",
        "   \n\t",
    ];

    for snippet in snippets {
        let (class, scores) = classifier.predict(snippet)?;
        let mut keys: Vec<&String> = scores.keys().collect();
        keys.sort();
        assert_eq!(keys, vec!["cpp", "java", "javascript", "python"]);
        let total: f64 = scores.values().map(|&p| p as f64).sum();
        assert!((total - 1.0).abs() < 1e-6, "probabilities sum to {}", total);
        assert!(scores.contains_key(&class));
    }
    Ok(())
}

#[test]
fn test_prediction_is_deterministic() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = setup_test_classifier();
    let code = "for (let i = 0; i < 3; i++) { console.log(i); }";
    assert_eq!(classifier.predict(code)?, classifier.predict(code)?);
    Ok(())
}

#[test]
fn test_training_is_reproducible() -> Result<(), Box<dyn std::error::Error>> {
    let first = setup_test_classifier();
    let second = setup_test_classifier();
    assert_eq!(first.fingerprint(), second.fingerprint());
    let code = "std::vector<int> v;";
    assert_eq!(first.predict(code)?, second.predict(code)?);
    Ok(())
}

#[test]
fn test_prediction_validation() {
    let classifier = setup_test_classifier();
    assert!(matches!(
        classifier.predict(""),
        Err(ClassifierError::ValidationError(_))
    ));
}

#[test]
fn test_thread_safety() {
    let classifier = Arc::new(setup_test_classifier());
    let mut handles = vec![];

    for _ in 0..3 {
        let classifier = Arc::clone(&classifier);
        let handle = thread::spawn(move || {
            let result = classifier.predict("print('hi')");
            assert!(result.is_ok());
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}
