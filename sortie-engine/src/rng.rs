//! Seeded random streams for one generation pass.
//!
//! Every consumer draws from its own domain-separated stream so that adding
//! a draw in, say, ground padding never shifts the air mission rolls.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::Sha256;
use std::cell::{RefCell, RefMut};

#[derive(Debug)]
pub struct RngBundle {
    seed: u64,
    air: RefCell<CountingRng<ChaCha8Rng>>,
    ground: RefCell<CountingRng<ChaCha8Rng>>,
    environment: RefCell<CountingRng<ChaCha8Rng>>,
    padding: RefCell<CountingRng<ChaCha8Rng>>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            air: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"air"))),
            ground: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"ground"))),
            environment: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"environment"))),
            padding: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"padding"))),
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Access the air operations stream.
    #[must_use]
    pub fn air(&self) -> RefMut<'_, CountingRng<ChaCha8Rng>> {
        self.air.borrow_mut()
    }

    /// Access the ground operations stream.
    #[must_use]
    pub fn ground(&self) -> RefMut<'_, CountingRng<ChaCha8Rng>> {
        self.ground.borrow_mut()
    }

    /// Access the weather/time stream.
    #[must_use]
    pub fn environment(&self) -> RefMut<'_, CountingRng<ChaCha8Rng>> {
        self.environment.borrow_mut()
    }

    /// Access the procedural padding stream.
    #[must_use]
    pub fn padding(&self) -> RefMut<'_, CountingRng<ChaCha8Rng>> {
        self.padding.borrow_mut()
    }

    /// Total draws across all streams.
    #[must_use]
    pub fn draws(&self) -> u64 {
        [&self.air, &self.ground, &self.environment, &self.padding]
            .iter()
            .map(|stream| stream.borrow().draws())
            .sum()
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<ChaCha8Rng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
