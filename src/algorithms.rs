// Bundled sort programs

/// A ready-made sort script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    #[default]
    InsertionSort,
    BubbleSort,
    SelectionSort,
    QuickSort,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::InsertionSort,
        Algorithm::BubbleSort,
        Algorithm::SelectionSort,
        Algorithm::QuickSort,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::InsertionSort => "Insertion Sort",
            Algorithm::BubbleSort => "Bubble Sort",
            Algorithm::SelectionSort => "Selection Sort",
            Algorithm::QuickSort => "Quick Sort",
        }
    }

    pub fn source(self) -> &'static str {
        match self {
            Algorithm::InsertionSort => include_str!("../demos/insertion_sort.js"),
            Algorithm::BubbleSort => include_str!("../demos/bubble_sort.js"),
            Algorithm::SelectionSort => include_str!("../demos/selection_sort.js"),
            Algorithm::QuickSort => include_str!("../demos/quick_sort.js"),
        }
    }

    /// The next program in [`Algorithm::ALL`], wrapping around
    pub fn next(self) -> Algorithm {
        let index = Self::ALL.iter().position(|&a| a == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

/// Program loaded when no file is given
pub fn default_program() -> &'static str {
    Algorithm::default().source()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::executor::execute;

    #[test]
    fn test_every_program_sorts() {
        let dataset = Dataset::default();
        let mut expected = dataset.values().to_vec();
        expected.sort_by(|a, b| a.total_cmp(b));

        for algorithm in Algorithm::ALL {
            let outcome = execute(algorithm.source(), dataset.values());
            assert!(outcome.is_success(), "{}: {:?}", algorithm.name(), outcome.error);
            let last = outcome.steps.last().unwrap();
            assert_eq!(last.array, expected, "{}", algorithm.name());
            assert_eq!(last.description, "Sorting Complete!");
        }
    }

    #[test]
    fn test_next_wraps() {
        assert_eq!(Algorithm::QuickSort.next(), Algorithm::InsertionSort);
        assert_eq!(Algorithm::InsertionSort.next(), Algorithm::BubbleSort);
    }
}
