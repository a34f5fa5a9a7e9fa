//! # Spirit Pool
//!
//! The twenty collectible spirits an egg can hatch into, and the picker that
//! chooses one. The picker prefers spirits the child does not own yet and
//! falls back to the full pool once the collection is complete.

use rand::seq::SliceRandom;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::Spirit;
use std::sync::Mutex;

struct SpiritEntry {
    id: &'static str,
    name: &'static str,
    desc: &'static str,
}

static SPIRIT_POOL: [SpiritEntry; 20] = [
    SpiritEntry {
        id: "aki",
        name: "Aki the Cherry Blossom Spirit",
        desc: "Aki hopped out of the very first cherry blossom of spring. When you feel scared or want to give up, she bounces on your shoulder and says: \"Let's just do one small step first!\" Every finished task makes a new flower bloom.",
    },
    SpiritEntry {
        id: "flower",
        name: "Blossom the Meadow Spirit",
        desc: "Blossom hides in the soft grass and turns your little efforts into big achievements. Her flower crown remembers your good habits, and when you are tired she sends a sweet smell to cheer you on.",
    },
    SpiritEntry {
        id: "moon",
        name: "Silvermoon Spirit",
        desc: "Silvermoon guards the night and makes noisy things quiet. When you need to focus he sprinkles silver moonlight so the distraction bubbles float away. Finish your tasks before bed and he makes your dreams soft as cotton candy.",
    },
    SpiritEntry {
        id: "fire",
        name: "Blaze the Flame Spirit",
        desc: "Blaze is a little red torch who loves to see you move. When you start a job his tail glows orange and your hands get quick and strong. Stuck on a puzzle? Blaze shouts with you: \"One, two, three, go!\"",
    },
    SpiritEntry {
        id: "leaf",
        name: "Breezeleaf Spirit",
        desc: "Breezeleaf lives in the treetops and blows cool wind to chase worries away. When things get messy he whispers: \"Tidy the desk, then tidy the mind.\" Every time you help at home he gives you a shiny green medal.",
    },
    SpiritEntry {
        id: "silver",
        name: "Sparkle the Silver Spirit",
        desc: "Sparkle's eyes twinkle like tiny stars and he turns rules into games. When you finish a task he draws a silver lightning racetrack in the sky so you can zoom to victory like a race car driver.",
    },
    SpiritEntry {
        id: "unicorn",
        name: "Unicorn Spirit",
        desc: "The Unicorn Spirit's magic horn turns sad things into rainbow bubbles. When you feel like crying she helps you take a deep breath. Every kind word, shared toy or brave sorry earns you a ray of rainbow light.",
    },
    SpiritEntry {
        id: "star",
        name: "Stargazer Spirit",
        desc: "Stargazer paints the sky and turns each good deed into a little star. When you think you did not do well enough he points up and says: \"Look! That bright star is the effort you just made!\"",
    },
    SpiritEntry {
        id: "rose",
        name: "Rose Spirit",
        desc: "Rose is pretty and brave and knows a secret: play is more fun once the chores are done. When you tidy up, her petals grow redder and brighter, and she holds your hand to cheer you on.",
    },
    SpiritEntry {
        id: "wind",
        name: "Valley Wind Spirit",
        desc: "Valley Wind appears when something feels too hard and blows the difficulty apart. \"Let's do the easiest part first!\" he says, and when you finish he whistles a happy tune in your ear.",
    },
    SpiritEntry {
        id: "sound",
        name: "Melody Spirit",
        desc: "Melody lives inside cheerful songs and adds music to your efforts. While you brush your teeth or pack your bag she taps out a ding-dong rhythm, and she plays a victory theme when a task is done.",
    },
    SpiritEntry {
        id: "story",
        name: "Storyteller Spirit",
        desc: "Storyteller turns your daily tasks into big adventures. Every finished job turns a page, and you are the bravest hero of the book. Start doing and your story becomes amazing!",
    },
    SpiritEntry {
        id: "hope",
        name: "Hope Spirit",
        desc: "Hope is a little lantern that glows warm when you are about to give up. She cuts big problems into bite-sized snacks. \"No need to finish everything at once, a little every day gets us there!\"",
    },
    SpiritEntry {
        id: "sun",
        name: "Sunny Spirit",
        desc: "Sunny loves children who wake up on time. Get up and pack your own school bag and he gives you a golden sun shield that keeps you charged all day long.",
    },
    SpiritEntry {
        id: "color",
        name: "Lulu the Rainbow Fairy",
        desc: "Lulu was born from a rainbow after the rain. When a task feels scary she builds a rainbow path to guide you, and she hugs every hard-working child with her gentle light.",
    },
    SpiritEntry {
        id: "water",
        name: "Dewdrop Spirit",
        desc: "Dewdrop is a cool little water drop who calms a hot head. When you are in a hurry or getting angry she asks you to stop, drink some water and breathe. Stay calm and she glows a clear blue light for you.",
    },
    SpiritEntry {
        id: "shine",
        name: "Flash the Shining Spirit",
        desc: "Flash is a tiny superhero who races the clock. When you work quickly without dawdling his tail flashes blue lightning and charges up the whole forest.",
    },
    SpiritEntry {
        id: "wood",
        name: "Moonleaf Spirit",
        desc: "Moonleaf is a quiet guardian who loves watching you concentrate. While you read or write he rustles his leaves so time feels slow and cosy. \"Focus is a superpower, and you are getting stronger!\"",
    },
    SpiritEntry {
        id: "time",
        name: "Hourglass Spirit",
        desc: "Hourglass carries a magic sand timer that catches the dawdle monster. Try a task for just five minutes and he casts a spell that makes it quick and easy.",
    },
    SpiritEntry {
        id: "light",
        name: "Beam the Light Spirit",
        desc: "Beam is the captain of light and cheers loudly whenever you finish a task. \"There is a little sun in your heart, and when you work happily it lights up everyone!\"",
    },
];

fn to_spirit(entry: &SpiritEntry) -> Spirit {
    Spirit {
        id: entry.id.to_string(),
        name: entry.name.to_string(),
        img: format!("assets/spirits/{}.png", entry.id),
        desc: entry.desc.to_string(),
    }
}

/// Every spirit an egg can hatch into
pub fn spirit_pool() -> Vec<Spirit> {
    SPIRIT_POOL.iter().map(to_spirit).collect()
}

pub fn find_spirit(id: &str) -> Option<Spirit> {
    SPIRIT_POOL.iter().find(|entry| entry.id == id).map(to_spirit)
}

/// Chooses the spirit revealed by a hatch
pub trait SpiritPicker: Send + Sync {
    /// `owned` holds the ids of spirits the child already hatched
    fn pick(&self, owned: &[String]) -> Spirit;
}

/// Random picker biased towards spirits the child does not own yet
pub struct RandomSpiritPicker<R: Rng + Send> {
    rng: Mutex<R>,
}

impl RandomSpiritPicker<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> RandomSpiritPicker<R> {
    pub fn new(rng: R) -> Self {
        Self { rng: Mutex::new(rng) }
    }
}

impl<R: Rng + Send> SpiritPicker for RandomSpiritPicker<R> {
    fn pick(&self, owned: &[String]) -> Spirit {
        let unowned: Vec<&SpiritEntry> = SPIRIT_POOL
            .iter()
            .filter(|entry| !owned.iter().any(|id| id == entry.id))
            .collect();

        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let chosen = if unowned.is_empty() {
            SPIRIT_POOL[..].choose(&mut *rng)
        } else {
            unowned.choose(&mut *rng).copied()
        };

        // The pool is a non-empty constant
        chosen.map(to_spirit).unwrap_or_else(|| to_spirit(&SPIRIT_POOL[0]))
    }
}
