//! Pull-based stream of padded batches.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::batch::Batch;
use crate::common::REFILL_POOL_FACTOR;
use crate::config::BatcherConfig;
use crate::errors::Result;
use crate::example::Example;
use crate::vocab::{CharTable, SharedIndex, Vocabulary};

/// Streams padded batches out of three line-aligned readers.
///
/// The generator is a pull-based lazy sequence: a request for the next
/// batch refills the internal pool only when the pending queue is
/// empty. A refill reads the context, question, and answer streams in
/// lockstep until any of them is exhausted or the pool cap is reached,
/// sorts the pooled examples by question length, slices them into
/// `batch_size` chunks, and shuffles the order of the chunks. Once the
/// streams are exhausted and the queue drains, the sequence ends; it is
/// not restartable.
///
/// The generator owns its readers, so file handles are released when it
/// is dropped, on every exit path.
pub struct BatchGenerator<C, Q, A> {
    vocab: Vocabulary,
    chars: CharTable,
    shared: SharedIndex,
    config: BatcherConfig,
    context: C,
    question: Q,
    answer: A,
    pending: VecDeque<Vec<Example>>,
    rng: StdRng,
    exhausted: bool,
    failed: bool,
}

impl BatchGenerator<BufReader<File>, BufReader<File>, BufReader<File>> {
    /// Opens the three data files and creates a generator over them.
    ///
    /// # Errors
    ///
    /// [`StaccatoError`](crate::errors::StaccatoError) is returned when
    /// the configuration is invalid or a file cannot be opened.
    pub fn from_paths<P>(
        vocab: Vocabulary,
        chars: CharTable,
        shared: SharedIndex,
        config: BatcherConfig,
        context_path: P,
        question_path: P,
        answer_path: P,
    ) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        Self::from_readers(
            vocab,
            chars,
            shared,
            config,
            BufReader::new(File::open(context_path)?),
            BufReader::new(File::open(question_path)?),
            BufReader::new(File::open(answer_path)?),
        )
    }
}

impl<C, Q, A> BatchGenerator<C, Q, A>
where
    C: BufRead,
    Q: BufRead,
    A: BufRead,
{
    /// Creates a generator over three open readers.
    ///
    /// # Errors
    ///
    /// [`StaccatoError`](crate::errors::StaccatoError) is returned when
    /// the configuration is invalid.
    pub fn from_readers(
        vocab: Vocabulary,
        chars: CharTable,
        shared: SharedIndex,
        config: BatcherConfig,
        context: C,
        question: Q,
        answer: A,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            vocab,
            chars,
            shared,
            config,
            context,
            question,
            answer,
            pending: VecDeque::new(),
            rng: StdRng::from_entropy(),
            exhausted: false,
            failed: false,
        })
    }

    /// Fixes the chunk-shuffling seed, for a reproducible batch order.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Reads the next line from each stream.
    ///
    /// Returns `Ok(None)` as soon as any stream hits end of input.
    fn read_line_triple(&mut self) -> Result<Option<(String, String, String)>> {
        let mut context_line = String::new();
        if self.context.read_line(&mut context_line)? == 0 {
            return Ok(None);
        }
        let mut question_line = String::new();
        if self.question.read_line(&mut question_line)? == 0 {
            return Ok(None);
        }
        let mut answer_line = String::new();
        if self.answer.read_line(&mut answer_line)? == 0 {
            return Ok(None);
        }
        Ok(Some((context_line, question_line, answer_line)))
    }

    /// Refills the pending queue from the input streams.
    ///
    /// Reads until any stream is exhausted or the pool holds
    /// `batch_size * REFILL_POOL_FACTOR` examples, then sorts the pool
    /// by question length, chunks it, and shuffles the chunk order.
    fn refill(&mut self) -> Result<()> {
        let tic = Instant::now();
        let cap = self.config.batch_size * REFILL_POOL_FACTOR;
        let mut pool = vec![];
        while !self.exhausted && pool.len() < cap {
            match self.read_line_triple()? {
                None => self.exhausted = true,
                Some((context_line, question_line, answer_line)) => {
                    if let Some(example) = Example::assemble(
                        &context_line,
                        &question_line,
                        &answer_line,
                        &self.vocab,
                        &self.chars,
                        &self.shared,
                        &self.config,
                    )? {
                        pool.push(example);
                    }
                }
            }
        }
        let num_examples = pool.len();

        // Sorting by context length instead would co-locate the same
        // context with its many questions in one batch; question length
        // is the bucketing key.
        pool.sort_by_key(|e| e.question_ids.len());

        let mut chunks = Vec::with_capacity(num_examples.div_ceil(self.config.batch_size));
        while !pool.is_empty() {
            let rest = pool.split_off(pool.len().min(self.config.batch_size));
            chunks.push(std::mem::replace(&mut pool, rest));
        }
        chunks.shuffle(&mut self.rng);
        self.pending.extend(chunks);

        log::debug!(
            "refilled {} batches from {} examples in {:.2?}",
            self.pending.len(),
            num_examples,
            tic.elapsed(),
        );
        Ok(())
    }
}

impl<C, Q, A> Iterator for BatchGenerator<C, Q, A>
where
    C: BufRead,
    Q: BufRead,
    A: BufRead,
{
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if self.pending.is_empty() {
            if self.exhausted {
                return None;
            }
            if let Err(e) = self.refill() {
                self.failed = true;
                return Some(Err(e));
            }
        }
        let chunk = self.pending.pop_front()?;
        Some(Ok(Batch::from_examples(chunk, &self.config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::io::Cursor;

    type TestGenerator = BatchGenerator<Cursor<String>, Cursor<String>, Cursor<String>>;

    #[track_caller]
    fn build_test_generator(
        contexts: &str,
        questions: &str,
        answers: &str,
        config: BatcherConfig,
    ) -> TestGenerator {
        let vocab = Vocabulary::new(["the", "cat", "sat", "on", "mat", "where", "did", "sit"]);
        let chars = CharTable::default();
        let shared = SharedIndex::new([(vocab.word_id("cat"), 0), (vocab.word_id("mat"), 1)]);
        BatchGenerator::from_readers(
            vocab,
            chars,
            shared,
            config,
            Cursor::new(contexts.to_string()),
            Cursor::new(questions.to_string()),
            Cursor::new(answers.to_string()),
        )
        .unwrap()
        .with_seed(42)
    }

    fn small_config() -> BatcherConfig {
        BatcherConfig {
            batch_size: 2,
            context_len: 8,
            question_len: 6,
            word_len: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_batch_sizes() {
        let generator = build_test_generator(
            "the cat\nthe mat\nthe cat sat\nthe mat sat\nthe cat sat on\n",
            "where\nwhere did\nwhere did the\nwhere\nwhere did\n",
            "0 0\n0 1\n1 2\n0 0\n2 3\n",
            small_config(),
        );
        let batches: Vec<Batch> = generator.map(|b| b.unwrap()).collect();
        assert_eq!(batches.len(), 3);

        let mut sizes: Vec<usize> = batches.iter().map(|b| b.batch_size()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, [1, 2, 2]);

        let total: usize = batches.iter().map(|b| b.batch_size()).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn test_question_lengths_sorted_within_batches() {
        let generator = build_test_generator(
            "the cat\nthe mat\nthe cat sat\nthe mat sat\nthe cat sat on\nthe mat\n",
            "where did the cat sit\nwhere\nwhere did\nwhere did the\nwhere\nwhere did the cat\n",
            "0 0\n0 1\n1 2\n0 0\n2 3\n0 1\n",
            small_config(),
        );
        for batch in generator {
            let batch = batch.unwrap();
            let lengths: Vec<u32> = batch
                .question_mask()
                .iter()
                .map(|m| m.iter().sum())
                .collect();
            let mut sorted = lengths.clone();
            sorted.sort_unstable();
            assert_eq!(lengths, sorted);
        }
    }

    #[test]
    fn test_ill_formed_span_absent_from_batches() {
        let generator = build_test_generator(
            "the cat\nthe mat\nthe cat sat\n",
            "where\nwhere did\nwhere\n",
            "0 0\n1 0\n0 1\n",
            small_config(),
        );
        let total: usize = generator.map(|b| b.unwrap().batch_size()).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_discard_long_examples_absent_from_batches() {
        let config = BatcherConfig {
            context_len: 2,
            discard_long: true,
            ..small_config()
        };
        let generator = build_test_generator(
            "the cat\nthe cat sat\nthe mat\n",
            "where\nwhere\nwhere\n",
            "0 0\n0 0\n0 0\n",
            config,
        );
        let batches: Vec<Batch> = generator.map(|b| b.unwrap()).collect();
        let total: usize = batches.iter().map(|b| b.batch_size()).sum();
        assert_eq!(total, 2);
        for batch in &batches {
            for mask in batch.context_mask() {
                assert!(mask.iter().sum::<u32>() <= 2);
            }
        }
    }

    #[test]
    fn test_unparseable_answer_is_fatal() {
        let mut generator = build_test_generator(
            "the cat\nthe mat\n",
            "where\nwhere\n",
            "0 0\n0 x\n",
            small_config(),
        );
        assert!(generator.next().unwrap().is_err());
        assert!(generator.next().is_none());
    }

    #[test]
    fn test_empty_input_yields_no_batches() {
        let mut generator = build_test_generator("", "", "", small_config());
        assert!(generator.next().is_none());
    }

    #[test]
    fn test_stops_at_shortest_stream() {
        let generator = build_test_generator(
            "the cat\nthe mat\nthe cat sat\n",
            "where\nwhere\n",
            "0 0\n0 0\n0 0\n",
            small_config(),
        );
        let total: usize = generator.map(|b| b.unwrap().batch_size()).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_pool_cap_resumes_reading() {
        // With batch_size 1 the pool caps at REFILL_POOL_FACTOR
        // examples, so one more line forces a second refill.
        let n = REFILL_POOL_FACTOR + 1;
        let contexts = "the cat\n".repeat(n);
        let questions = "where\n".repeat(n);
        let answers = "0 0\n".repeat(n);
        let config = BatcherConfig {
            batch_size: 1,
            ..small_config()
        };
        let generator = build_test_generator(&contexts, &questions, &answers, config);
        let batches: Vec<Batch> = generator.map(|b| b.unwrap()).collect();
        assert_eq!(batches.len(), n);
        assert!(batches.iter().all(|b| b.batch_size() == 1));
    }

    #[test]
    fn test_seeded_order_is_reproducible() {
        let data = (
            "the cat\nthe mat\nthe cat sat\nthe mat sat\n",
            "where\nwhere did\nwhere did the\nwhere\n",
            "0 0\n0 1\n1 2\n0 0\n",
        );
        let first: Vec<Vec<Vec<u32>>> = build_test_generator(data.0, data.1, data.2, small_config())
            .map(|b| b.unwrap().question_ids().to_vec())
            .collect();
        let second: Vec<Vec<Vec<u32>>> = build_test_generator(data.0, data.1, data.2, small_config())
            .map(|b| b.unwrap().question_ids().to_vec())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_from_paths() {
        let dir = tempfile::tempdir().unwrap();
        let context_path = dir.path().join("train.context");
        let question_path = dir.path().join("train.question");
        let answer_path = dir.path().join("train.answer");
        fs::write(&context_path, "the cat sat\nthe mat\n").unwrap();
        fs::write(&question_path, "where did the cat sit\nwhere\n").unwrap();
        fs::write(&answer_path, "1 2\n0 1\n").unwrap();

        let vocab = Vocabulary::new(["the", "cat", "sat", "on", "mat", "where", "did", "sit"]);
        let chars = CharTable::default();
        let shared = SharedIndex::new([(vocab.word_id("cat"), 0)]);
        let generator = BatchGenerator::from_paths(
            vocab,
            chars,
            shared,
            small_config(),
            &context_path,
            &question_path,
            &answer_path,
        )
        .unwrap()
        .with_seed(42);

        let batches: Vec<Batch> = generator.map(|b| b.unwrap()).collect();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].batch_size(), 2);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let vocab = Vocabulary::new(["the"]);
        let result = BatchGenerator::from_paths(
            vocab,
            CharTable::default(),
            SharedIndex::new([]),
            small_config(),
            dir.path().join("missing.context"),
            dir.path().join("missing.question"),
            dir.path().join("missing.answer"),
        );
        assert!(result.is_err());
    }
}
