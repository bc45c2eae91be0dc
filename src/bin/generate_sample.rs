//! Writes `sample_applicants.csv`, a ranked applicant list to try the app with.

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    /// Uniform integer in `0..n`.
    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Fisher–Yates shuffle.
    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            items.swap(i, self.below(i + 1));
        }
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }
}

const APPLICANTS: usize = 200;
/// Preference codes are drawn from `1..=PROGRAMS`.
const PROGRAMS: usize = 20;

fn main() {
    let mut rng = SimpleRng::new(42);

    let first = ["Sita", "Hari", "Gita", "Ram", "Anita", "Bikash", "Sunita", "Prakash", "Maya", "Suman"];
    let last = ["Thapa", "Rai", "Shrestha", "Gurung", "Karki", "Tamang", "Adhikari", "Magar"];
    let districts = ["Ilam", "Jhapa", "Kaski", "Kathmandu", "Lalitpur", "Morang", "Chitwan"];

    let output_path = "sample_applicants.csv";
    let mut writer = csv::Writer::from_path(output_path).expect("Failed to create output file");

    let mut header = vec!["Rank", "Applicant Name", "Gender", "District"];
    let prefs: Vec<String> = (1..=9).map(|i| format!("p{i}")).collect();
    header.extend(prefs.iter().map(String::as_str));
    writer.write_record(&header).expect("Failed to write header");

    let mut records = Vec::with_capacity(APPLICANTS);
    for rank in 1..=APPLICANTS {
        let gender = if rng.below(2) == 0 { "F" } else { "M" };
        let name = format!("{} {}", rng.pick(&first), rng.pick(&last));
        let district = rng.pick(&districts);

        // Applicants list between 3 and 9 distinct preferences; the rest stay blank.
        let listed = 3 + rng.below(7);
        let mut chosen: Vec<usize> = Vec::with_capacity(9);
        while chosen.len() < listed {
            let program = 1 + rng.below(PROGRAMS);
            if !chosen.contains(&program) {
                chosen.push(program);
            }
        }

        let mut record = vec![rank.to_string(), name, gender.to_string(), district.to_string()];
        record.extend((0..9).map(|i| chosen.get(i).map(|p| p.to_string()).unwrap_or_default()));
        records.push(record);
    }

    // Lists arrive in no particular order; the app sorts by rank.
    rng.shuffle(&mut records);
    for record in &records {
        writer.write_record(record).expect("Failed to write row");
    }

    writer.flush().expect("Failed to flush output file");
    println!("Wrote {APPLICANTS} applicants to {output_path}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shuffle_permutes_records() {
        let mut rng = SimpleRng::new(42);
        let mut ranks: Vec<usize> = (1..=APPLICANTS).collect();
        rng.shuffle(&mut ranks);

        assert_ne!(ranks, (1..=APPLICANTS).collect::<Vec<_>>());
        ranks.sort_unstable();
        assert_eq!(ranks, (1..=APPLICANTS).collect::<Vec<_>>());
    }
}
