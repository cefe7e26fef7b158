use rand::seq::{index, SliceRandom};
use rand::Rng;

pub const INTEGER_COUNT: usize = 5;
pub const REAL_COUNT: usize = 5;
pub const CHARACTER_COUNT: usize = 4;
pub const BOOLEAN_COUNT: usize = 3;
pub const STRING_COUNT: usize = 3;
pub const DATASET_SIZE: usize =
    INTEGER_COUNT + REAL_COUNT + CHARACTER_COUNT + BOOLEAN_COUNT + STRING_COUNT;

const INTEGER_RANGE: std::ops::Range<u32> = 1..100;
const REAL_RANGE: std::ops::Range<f64> = 1.0..99.0;
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const BOOLEANS: [&str; 2] = ["True", "False"];
const WORDS: [&str; 5] = ["Hello", "IB", "Code", "CS", "Data"];

/// One literal handed out for a round. `id` is unique within the round's dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub id: usize,
    pub text: String,
}

/// Builds a dataset from fixed literals, numbering them in order.
pub fn from_texts<I, S>(texts: I) -> Vec<Token>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    texts
        .into_iter()
        .enumerate()
        .map(|(id, text)| Token {
            id,
            text: text.into(),
        })
        .collect()
}

pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Vec<Token> {
    let mut texts: Vec<String> = Vec::with_capacity(DATASET_SIZE);

    let span = (INTEGER_RANGE.end - INTEGER_RANGE.start) as usize;
    texts.extend(
        index::sample(rng, span, INTEGER_COUNT)
            .into_iter()
            .map(|offset| (INTEGER_RANGE.start as usize + offset).to_string()),
    );

    for _ in 0..REAL_COUNT {
        texts.push(format_real(rng.gen_range(REAL_RANGE)));
    }

    texts.extend(
        UPPERCASE
            .choose_multiple(rng, CHARACTER_COUNT)
            .map(|&b| char::from(b).to_string()),
    );

    for _ in 0..BOOLEAN_COUNT {
        texts.push(pick(rng, &BOOLEANS));
    }

    for _ in 0..STRING_COUNT {
        texts.push(pick(rng, &WORDS));
    }

    texts.shuffle(rng);
    from_texts(texts)
}

fn pick<R: Rng + ?Sized>(rng: &mut R, choices: &[&str]) -> String {
    choices[rng.gen_range(0..choices.len())].to_string()
}

// Two decimals, trailing zeros trimmed, at least one fractional digit kept.
fn format_real(value: f64) -> String {
    let mut text = format!("{:.2}", value);
    while text.ends_with('0') && !text.ends_with(".0") {
        text.pop();
    }
    text
}
