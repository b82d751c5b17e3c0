use std::collections::{BTreeSet, HashMap, VecDeque};

use uuid::Uuid;

use crate::database::entities::tags;

/// Principal -> dependents view over tracked tags, keyed on current
/// `synonym_for_id` values.
#[derive(Debug, Default)]
pub struct SynonymIndex {
    dependents: HashMap<Uuid, BTreeSet<Uuid>>,
}

impl SynonymIndex {
    pub fn build<'a, I>(tags: I) -> Self
    where
        I: IntoIterator<Item = &'a tags::Model>,
    {
        let mut index = Self::default();
        for tag in tags {
            if let Some(principal) = tag.synonym_for_id {
                index.dependents.entry(principal).or_default().insert(tag.id);
            }
        }
        index
    }

    pub fn dependents_of(&self, principal: Uuid) -> impl Iterator<Item = Uuid> + '_ {
        self.dependents
            .get(&principal)
            .into_iter()
            .flat_map(|ids| ids.iter().copied())
    }

    /// Every tag reachable through synonym links from `roots`, excluding the
    /// roots themselves. Self-links and cycles are visited once.
    pub fn cascade_from<I>(&self, roots: I) -> Vec<Uuid>
    where
        I: IntoIterator<Item = Uuid>,
    {
        let mut seen: BTreeSet<Uuid> = BTreeSet::new();
        let mut queue: VecDeque<Uuid> = roots.into_iter().collect();
        seen.extend(queue.iter().copied());

        let mut cascaded = Vec::new();
        while let Some(principal) = queue.pop_front() {
            for dependent in self.dependents_of(principal) {
                if seen.insert(dependent) {
                    cascaded.push(dependent);
                    queue.push_back(dependent);
                }
            }
        }
        cascaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str, synonym_for: Option<&tags::Model>) -> tags::Model {
        let mut tag = tags::Model::new(name);
        tag.synonym_for_id = synonym_for.map(|t| t.id);
        tag
    }

    #[test]
    fn test_cascade_is_transitive() {
        let foo = tag("Foo", None);
        let bar = tag("Bar", Some(&foo));
        let baz = tag("Baz", Some(&bar));
        let other = tag("Other", None);

        let index = SynonymIndex::build([&foo, &bar, &baz, &other]);

        assert_eq!(index.dependents_of(foo.id).collect::<Vec<_>>(), vec![bar.id]);
        assert_eq!(index.cascade_from([foo.id]), vec![bar.id, baz.id]);
        assert!(index.cascade_from([other.id]).is_empty());
    }

    #[test]
    fn test_cascade_terminates_on_cycles() {
        let mut a = tags::Model::new("A");
        let mut b = tags::Model::new("B");
        a.synonym_for_id = Some(b.id);
        b.synonym_for_id = Some(a.id);

        let index = SynonymIndex::build([&a, &b]);
        assert_eq!(index.cascade_from([a.id]), vec![b.id]);
    }
}
