use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::errors::ConfigurationError;
use crate::domain::value_objects::RollRequest;

pub struct AttributeSelector<'a> {
    domain: &'a [String],
}

impl<'a> AttributeSelector<'a> {
    pub fn new(domain: &'a [String]) -> Self {
        Self { domain }
    }

    /// First override entry, else a uniform draw from the domain
    ///
    /// Callers wanting a random pick among several candidates shuffle the
    /// override list themselves.
    pub fn choose_attribute<R: Rng + ?Sized>(
        &self,
        request: &RollRequest,
        rng: &mut R,
    ) -> Result<String, ConfigurationError> {
        if let Some(first) = request.attribute_override.first() {
            return Ok(first.clone());
        }

        self.domain
            .choose(rng)
            .cloned()
            .ok_or(ConfigurationError::EmptyDomain("attribute"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_override_first_entry_wins() {
        let domain = vec!["Data".to_string()];
        let request = RollRequest {
            attribute_override: vec!["Lucky".into(), "Virus".into()],
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            AttributeSelector::new(&domain).choose_attribute(&request, &mut rng),
            Ok("Lucky".to_string())
        );
    }

    #[test]
    fn test_empty_domain() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            AttributeSelector::new(&[]).choose_attribute(&RollRequest::default(), &mut rng),
            Err(ConfigurationError::EmptyDomain("attribute"))
        );
    }
}
