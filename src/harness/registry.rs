//! Ordered, name-unique collection of extracted tests.

use std::collections::HashMap;

use crate::error::GenError;
use crate::harness::ExtractedTest;

/// Tests in discovery order, with a side index that rejects name collisions.
#[derive(Debug, Default)]
pub struct TestRegistry {
    tests: Vec<ExtractedTest>,
    index: HashMap<String, usize>,
}

impl TestRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a test.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::DuplicateTestName`] naming both locations if a test
    /// with the same name was already added. The registry is unchanged.
    pub fn push(&mut self, test: ExtractedTest) -> Result<(), GenError> {
        if let Some(&existing) = self.index.get(&test.name) {
            return Err(GenError::DuplicateTestName {
                name: test.name,
                first: self.tests[existing].location.clone(),
                second: test.location,
            });
        }
        self.index.insert(test.name.clone(), self.tests.len());
        self.tests.push(test);
        Ok(())
    }

    /// Tests in the order they were added.
    #[must_use]
    pub fn tests(&self) -> &[ExtractedTest] {
        &self.tests
    }

    /// Number of registered tests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Returns `true` when no tests were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}
