//! Random pet names: `adverb-...-adjective-name`.

use crate::core::types::RandomPetArgs;
use rand::seq::SliceRandom;
use rand::Rng;

/// Upper bound on words; guards against absurd configuration.
pub const MAX_LENGTH: u32 = 64;

const ADVERBS: &[&str] = &[
    "abnormally", "absolutely", "actively", "amazingly", "annually", "badly",
    "barely", "blindly", "boldly", "briefly", "brightly", "broadly", "busily",
    "calmly", "carefully", "certainly", "cheaply", "cleanly", "closely",
    "correctly", "daily", "deeply", "directly", "easily", "eagerly", "equally",
    "evenly", "exactly", "fairly", "firmly", "freely", "frankly", "gladly",
    "gently", "greatly", "happily", "highly", "honestly", "hugely", "ideally",
    "jointly", "kindly", "largely", "lively", "loudly", "luckily", "mainly",
    "merely", "mildly", "mostly", "namely", "nearly", "neatly", "newly",
    "nicely", "openly", "partly", "politely", "poorly", "precisely", "quickly",
    "quietly", "rapidly", "rarely", "really", "recently", "sadly", "safely",
    "sharply", "simply", "slowly", "smoothly", "solely", "strongly", "surely",
    "swiftly", "truly", "vastly", "warmly", "wholly", "widely", "wildly",
];

const ADJECTIVES: &[&str] = &[
    "able", "active", "adapted", "amazed", "apt", "awake", "big", "bold",
    "brave", "bright", "busy", "calm", "careful", "champion", "charming",
    "clean", "clever", "close", "cool", "cosmic", "crack", "curious", "daring",
    "dear", "decent", "deep", "driven", "eager", "easy", "enabled", "epic",
    "exact", "fair", "fast", "fine", "firm", "fit", "fluent", "fond", "free",
    "fresh", "full", "funny", "game", "gentle", "giving", "glad", "golden",
    "good", "grand", "great", "happy", "hardy", "helped", "heroic", "honest",
    "humble", "ideal", "immune", "in", "innocent", "intent", "keen", "key",
    "kind", "large", "legal", "liberal", "light", "live", "lively", "logical",
    "loved", "loyal", "lucky", "magical", "main", "massive", "merry", "mighty",
    "modern", "moved", "native", "neat", "needed", "new", "nice", "noble",
    "normal", "notable", "novel", "open", "optimal", "patient", "perfect",
    "pleasant", "polite", "popular", "precious", "present", "pretty", "prime",
    "proper", "proud", "quick", "quiet", "rapid", "rare", "ready", "real",
    "relaxed", "renewed", "rich", "right", "robust", "saving", "secure",
    "settled", "sharp", "shining", "simple", "smart", "smooth", "social",
    "solid", "sound", "special", "splendid", "square", "stable", "steady",
    "still", "strong", "sunny", "super", "sure", "sweet", "swift", "tender",
    "thankful", "tidy", "topical", "tough", "trusted", "trusty", "ultimate",
    "unique", "united", "up", "usable", "valid", "vast", "verified", "vital",
    "warm", "welcome", "well", "whole", "wise", "witty", "worthy",
];

const NAMES: &[&str] = &[
    "aardvark", "albatross", "alpaca", "ant", "antelope", "baboon", "badger",
    "barnacle", "bass", "bat", "bear", "beetle", "bison", "boar", "bobcat",
    "buffalo", "bull", "camel", "cardinal", "caribou", "cat", "catfish",
    "cheetah", "chicken", "chipmunk", "cicada", "clam", "cobra", "cod",
    "condor", "coral", "cougar", "cow", "coyote", "crab", "crane", "cricket",
    "crow", "cub", "deer", "dingo", "dodo", "dog", "dolphin", "donkey", "dove",
    "dragon", "duck", "eagle", "eel", "elk", "emu", "falcon", "ferret", "finch",
    "fish", "flamingo", "fly", "fowl", "fox", "frog", "gar", "gazelle", "gecko",
    "gibbon", "giraffe", "gnat", "gnu", "goat", "goose", "gopher", "grouse",
    "grub", "gull", "halibut", "hamster", "hare", "hawk", "hedgehog", "hen",
    "heron", "hog", "hornet", "horse", "hound", "husky", "ibex", "iguana",
    "impala", "jackal", "jaguar", "jay", "kangaroo", "kid", "kit", "kite",
    "koala", "lamb", "lark", "lemming", "lemur", "leopard", "lion", "lizard",
    "llama", "lobster", "locust", "lynx", "macaw", "mackerel", "magpie",
    "mallard", "mammoth", "manatee", "marlin", "marmot", "marten", "midge",
    "mink", "mole", "mongoose", "monkey", "moose", "moth", "mouse", "mule",
    "mustang", "newt", "ocelot", "octopus", "orca", "oriole", "osprey",
    "ostrich", "otter", "owl", "ox", "oyster", "panda", "panther", "parrot",
    "peacock", "pelican", "penguin", "pheasant", "pig", "pigeon", "piglet",
    "polecat", "pony", "poodle", "porpoise", "possum", "puma", "python",
    "quail", "rabbit", "raccoon", "ram", "raven", "redbird", "reindeer",
    "rhino", "robin", "rooster", "salmon", "seal", "shark", "sheep", "shrew",
    "skink", "skunk", "sloth", "snail", "snake", "sparrow", "spider", "squid",
    "stag", "starfish", "stork", "swan", "swift", "tahr", "tapir", "teal",
    "terrier", "tetra", "tick", "tiger", "toad", "tortoise", "toucan", "trout",
    "tuna", "turkey", "turtle", "urchin", "viper", "vole", "vulture", "walrus",
    "warthog", "wasp", "weasel", "whale", "wolf", "wombat", "worm", "wren",
    "yak", "zebra",
];

/// Reject arguments the generator cannot honour.
pub fn check(args: &RandomPetArgs) -> Result<(), String> {
    let length = args.effective_length();
    if length == 0 {
        return Err("length must be at least 1".to_string());
    }
    if length > MAX_LENGTH {
        return Err(format!("length must be at most {}, got {}", MAX_LENGTH, length));
    }
    Ok(())
}

/// Generate a pet name. One word is a bare name, two prepend an adjective,
/// every further word is an adverb in front.
pub fn generate<R: Rng + ?Sized>(args: &RandomPetArgs, rng: &mut R) -> String {
    let length = args.effective_length().max(1) as usize;
    let mut words: Vec<&str> = Vec::with_capacity(length + 1);

    if let Some(ref prefix) = args.prefix {
        words.push(prefix.as_str());
    }
    for _ in 2..length {
        words.push(pick(ADVERBS, rng));
    }
    if length >= 2 {
        words.push(pick(ADJECTIVES, rng));
    }
    words.push(pick(NAMES, rng));

    words.join(args.effective_separator())
}

fn pick<R: Rng + ?Sized>(list: &'static [&'static str], rng: &mut R) -> &'static str {
    list.choose(rng).copied().unwrap_or("pet")
}
