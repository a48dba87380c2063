use std::error::Error;

use staccato::{BatchGenerator, BatcherConfig, CharTable, SharedIndex, Vocabulary};

fn main() -> Result<(), Box<dyn Error>> {
    // A toy corpus. Real pipelines point `BatchGenerator::from_paths`
    // at {train,dev}.{context,question,answer} files instead.
    let contexts = "\
the cat sat on the mat
the dog slept by the door
the cat chased the dog
";
    let questions = "\
where did the cat sit ?
who slept by the door ?
who chased the dog ?
";
    let answers = "\
3 5
1 1
1 1
";

    let vocab = Vocabulary::new([
        "the", "cat", "sat", "on", "mat", "dog", "slept", "by", "door", "chased", "where", "did",
        "sit", "who", "?",
    ]);
    let chars = CharTable::default();

    // Pretend "cat" and "dog" have rows in a shared embedding table.
    let shared = SharedIndex::new([(vocab.word_id("cat"), 0), (vocab.word_id("dog"), 1)]);

    let config = BatcherConfig {
        batch_size: 2,
        context_len: 12,
        question_len: 8,
        word_len: 6,
        ..Default::default()
    };

    let generator = BatchGenerator::from_readers(
        vocab,
        chars,
        shared,
        config.clone(),
        contexts.as_bytes(),
        questions.as_bytes(),
        answers.as_bytes(),
    )?
    .with_seed(42);

    for (i, batch) in generator.enumerate() {
        let batch = batch?;
        println!(
            "batch {}: {} examples, context ids {}x{}, question ids {}x{}",
            i,
            batch.batch_size(),
            batch.batch_size(),
            config.context_len,
            batch.batch_size(),
            config.question_len,
        );
        for (answer, span) in batch.answer_tokens().iter().zip(batch.answer_span()) {
            println!("  answer [{} {}]: {}", span[0], span[1], answer.join(" "));
        }
    }

    Ok(())
}
