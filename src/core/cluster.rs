use crate::config::Tolerance;
use crate::core::group::Group;
use crate::core::registry::{ItemId, ItemRegistry};
use crate::index::{SearchThresholds, SimilarityIndex};
use indicatif::ProgressBar;
use std::collections::TryReserveError;
use tracing::{debug, error, info, warn};

/// Which group owns each item id during a single clustering run.
///
/// Owners are positions into the run's group list. Ownership is claimed once
/// and never moved to another group.
#[derive(Debug)]
pub struct GroupIndex {
    owners: Vec<Option<usize>>,
}

impl GroupIndex {
    /// Allocate slots for ids `1..=size`.
    pub fn with_size(size: usize) -> Result<Self, TryReserveError> {
        let mut owners = Vec::new();
        owners.try_reserve_exact(size + 1)?;
        owners.resize(size + 1, None);
        Ok(Self { owners })
    }

    pub fn owner(&self, id: ItemId) -> Option<usize> {
        self.owners.get(id).copied().flatten()
    }

    /// Record `group` as the owner of `id` unless another group got there first.
    ///
    /// Returns the owner after the call. Ids outside the allocated range are
    /// ignored.
    pub fn claim(&mut self, id: ItemId, group: usize) -> Option<usize> {
        let slot = self.owners.get_mut(id)?;
        Some(*slot.get_or_insert(group))
    }
}

/// Groups produced by one clustering run, stored in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clusters {
    groups: Vec<Group>,
    truncated: bool,
}

impl Clusters {
    /// Groups in creation order (ascending group number)
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Most recently created group first; this is the order groups are printed in.
    pub fn newest_first(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// True when the run stopped early because a new group couldn't be allocated.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

}

/// Where a clustering run gets its memory from.
///
/// Both reservations may fail; the engine turns a failed owner map into an
/// empty result and a failed group slot into a truncated one.
pub trait GroupAllocator {
    fn owners(&self, size: usize) -> Result<GroupIndex, TryReserveError> {
        GroupIndex::with_size(size)
    }

    fn group_slot(&self, groups: &mut Vec<Group>) -> Result<(), TryReserveError> {
        groups.try_reserve(1)
    }
}

/// Plain heap allocation.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapAllocator;

impl GroupAllocator for HeapAllocator {}

/// Turns pairwise similarity search results into groups in one pass.
pub struct ClusteringEngine {
    thresholds: SearchThresholds,
    progress: ProgressBar,
    allocator: Box<dyn GroupAllocator>,
}

impl ClusteringEngine {
    pub fn new(tolerance: Tolerance) -> Self {
        Self::with_thresholds(tolerance.thresholds())
    }

    pub fn with_thresholds(thresholds: SearchThresholds) -> Self {
        Self {
            thresholds,
            progress: ProgressBar::hidden(),
            allocator: Box::new(HeapAllocator),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_allocator<A: GroupAllocator + 'static>(mut self, allocator: A) -> Self {
        self.allocator = Box::new(allocator);
        self
    }

    /// Walk ids `1..size` once, seeding a search from every live item that
    /// is not yet grouped.
    ///
    /// The last id is never used as a seed, it can only join a group as a
    /// match. A seed whose matches include an already grouped id joins the
    /// first such group in match order; otherwise a new group is started.
    /// Matches already owned by a different group are listed in the target
    /// group too but keep their original owner, so groups are never merged
    /// after the fact.
    pub fn run<I>(&self, registry: &ItemRegistry, index: &I) -> Clusters
    where
        I: SimilarityIndex + ?Sized,
    {
        let size = registry.size();
        let mut owners = match self.allocator.owners(size) {
            Ok(owners) => owners,
            Err(e) => {
                error!("Can't allocate groups map: {}", e);
                return Clusters::default();
            }
        };

        let mut groups: Vec<Group> = Vec::new();
        let mut next_number = 1;
        let mut truncated = false;

        self.progress.set_length(size.saturating_sub(1) as u64);

        for id in 1..size {
            self.progress.set_position(id as u64);

            if registry.get(id).is_none() {
                continue;
            }
            if owners.owner(id).is_some() {
                continue;
            }

            let result = match index.search(id, &self.thresholds) {
                Ok(result) => result,
                Err(e) => {
                    debug!("Search for item #{} failed: {}", id, e);
                    continue;
                }
            };
            if result.matches.is_empty() {
                continue;
            }

            let target = match result.ids().find_map(|member| owners.owner(member)) {
                Some(position) => position,
                None => {
                    if let Err(e) = self.allocator.group_slot(&mut groups) {
                        warn!("Can't create new image group: {}", e);
                        truncated = true;
                        break;
                    }
                    groups.push(Group::new(next_number));
                    next_number += 1;
                    groups.len() - 1
                }
            };

            let group = &mut groups[target];
            for member in std::iter::once(id).chain(result.ids()) {
                if let Err(e) = group.append(member) {
                    warn!("Can't add item #{} to group: {}", member, e);
                    continue;
                }
                owners.claim(member, target);
            }
        }

        self.progress.finish_and_clear();
        info!("Found {} image group(s)", groups.len());

        Clusters { groups, truncated }
    }
}
