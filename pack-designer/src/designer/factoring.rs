use itertools::Itertools;

/// Length of the factoring tuples searched by the designer. The first two
/// components bind to the inner 2-D grid (module or cell block), the last
/// three to the outer 3-D stack (string or pack).
pub const FACTORS: usize = 5;

/// Increases the factor at `level` and resets all factors below it to one,
/// which switches the backtracking search to the next upper branch.
fn next_branch(parameter: &mut [u32; FACTORS], level: usize) {
    parameter[level] += 1;
    for factor in parameter.iter_mut().take(level) {
        *factor = 1;
    }
}

fn product(parameter: &[u32; FACTORS]) -> u64 {
    parameter
        .iter()
        .fold(1u64, |acc, &factor| acc.saturating_mul(factor as u64))
}

/// Enumerates every 5-tuple of positive integers whose product is at least
/// `target`.
///
/// A modified backtracking search walks the sorted representative space: a
/// representative is accepted when its product reaches the target and its
/// largest factor does not exceed the cap left behind by the previous accept.
/// The cap shrinks with every accepted representative, which keeps the search
/// finite and prevents re-emitting the same shape with a larger factor.
/// Accepted representatives are then expanded into all distinct permutations,
/// since the tuple positions bind to geometric axes downstream.
pub fn factorings(target: u64) -> Vec<[u32; FACTORS]> {
    let mut parameter = [1u32; FACTORS];
    let max_level = FACTORS - 1;
    let mut max_value: Option<u32> = None;
    let mut level = 0usize;
    let mut representatives: Vec<[u32; FACTORS]> = Vec::new();
    loop {
        let max_factor = parameter.iter().copied().max().unwrap_or(1);
        if max_value.is_none_or(|cap| max_factor <= cap) {
            if product(&parameter) >= target {
                representatives.push(parameter);
                max_value = Some(max_factor - 1);
                level += 1;
                next_branch(&mut parameter, level);
                level = 0;
            } else {
                parameter[level] += 1;
            }
        } else {
            let index = parameter
                .iter()
                .position(|&factor| factor == max_factor)
                .unwrap_or(max_level);
            level = index + 1;
            if level > max_level {
                break;
            }
            next_branch(&mut parameter, level);
            level = 0;
        }
    }
    let mut solutions = Vec::new();
    for representative in &representatives {
        for permutation in representative
            .iter()
            .copied()
            .permutations(FACTORS)
            .unique()
        {
            let mut tuple = [1u32; FACTORS];
            tuple.copy_from_slice(&permutation);
            solutions.push(tuple);
        }
    }
    solutions
}
