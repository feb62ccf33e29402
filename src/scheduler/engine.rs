//! Block scheduler entry points.
//!
//! # Window search
//!
//! 1. Start no earlier than the latest material availability.
//! 2. Compute the required capacity at that start.
//! 3. Reject activities locked to another resource.
//! 4. Chain the phase searches over the current timeline.
//! 5. Admit the window by capacity type:
//!
//! | Capacity type | Admission |
//! |---------------|-----------|
//! | `SingleTasking` | No foreign reservation intersects the window |
//! | `MultiTasking` | Attention stays within the limit; no foreign move reservation |
//! | `Infinite` | Always |
//!
//! 6. Let the schedule customization veto the window.
//!
//! # Commit
//!
//! [`ResourceSimulationState::schedule`] inserts the block, releases the
//! activity's reservations, merges a same-batch clean-before into the
//! previous block, updates sequencing and, on single-tasking resources,
//! rebuilds the timeline with the block's usage segments as `Occupied`
//! time. A paused block leaves the time it skipped to its owner.

use tracing::{debug, info, warn};

use super::collaborators::{
    EventSink, MaterialAllocator, NoCustomization, RetryCause, RetryEvent, ScheduleCustomization,
    UnconstrainedMaterials, Verdict,
};
use super::state::{Lifecycle, ResourceSimulationState};
use crate::attention::{first_shortfall, AttentionLoad};
use crate::error::{CapacityError, CapacityResult};
use crate::models::{
    Activity, Block, BlockId, CapacityType, CleanSpan, RequiredCapacity, Tick,
};
use crate::reservation::Hold;
use crate::search::{
    find_chain, find_chain_reverse, ChainRequest, ReasonCode, SearchFailure, SearchResult,
    SearchSuccess,
};
use crate::sequencing::SequencingSnapshot;
use crate::setup::RequiredCapacityCalculator;
use crate::timeline::{rebuild, Cursor};

/// Per-call inputs of a window search.
pub struct SearchContext<'a> {
    /// Simulation clock.
    pub clock: Tick,
    pub materials: &'a dyn MaterialAllocator,
    pub customization: &'a dyn ScheduleCustomization,
    /// Holds of the activity's other requirements already earmarked to this resource.
    pub earmarked: &'a [Hold],
    /// Cursor from a previous search on this resource.
    pub hint: Option<Cursor>,
}

impl<'a> SearchContext<'a> {
    /// Context with unconstrained materials and no customization.
    pub fn new(clock: Tick) -> Self {
        Self {
            clock,
            materials: &UnconstrainedMaterials,
            customization: &NoCustomization,
            earmarked: &[],
            hint: None,
        }
    }

    pub fn with_materials(mut self, materials: &'a dyn MaterialAllocator) -> Self {
        self.materials = materials;
        self
    }

    pub fn with_customization(mut self, customization: &'a dyn ScheduleCustomization) -> Self {
        self.customization = customization;
        self
    }

    pub fn with_earmarked(mut self, earmarked: &'a [Hold]) -> Self {
        self.earmarked = earmarked;
        self
    }

    pub fn with_hint(mut self, hint: Option<Cursor>) -> Self {
        self.hint = hint;
        self
    }
}

/// Result of a window search with the capacity it was searched for.
#[derive(Debug, Clone)]
pub struct WindowSearch {
    /// Tick the search was anchored at: the material-adjusted start, or
    /// the finish of a reverse search.
    pub at: Tick,
    pub required: RequiredCapacity,
    pub result: SearchResult,
}

impl WindowSearch {
    fn failed(at: Tick, required: RequiredCapacity, reason: ReasonCode) -> Self {
        Self {
            at,
            required,
            result: SearchResult::Failure(SearchFailure::new(reason, None)),
        }
    }

    pub fn success(&self) -> Option<&SearchSuccess> {
        self.result.success()
    }

    pub fn failure(&self) -> Option<&SearchFailure> {
        self.result.failure()
    }
}

impl ResourceSimulationState {
    /// Required capacity of `activity` starting at `start` after `left`.
    pub fn compute_required_capacity(
        &self,
        activity: &Activity,
        left: &SequencingSnapshot,
        start: Tick,
        clock: Tick,
    ) -> CapacityResult<RequiredCapacity> {
        RequiredCapacityCalculator::new(
            &self.resource,
            &self.config,
            &self.timeline,
            self.blocks.as_slice(),
            &self.history,
        )
        .compute(activity, left, start, clock)
    }

    /// Finds the earliest admissible window for one resource requirement
    /// of `activity` at or after `start`.
    ///
    /// # Errors
    /// - [`CapacityError::Lifecycle`] outside a simulation pass
    /// - [`CapacityError::UnknownRequirement`] for a bad requirement index
    /// - any contract violation raised by the calculation or the search
    ///
    /// # Example
    ///
    /// ```
    /// use u_capacity::config::EngineConfig;
    /// use u_capacity::models::{Activity, Resource};
    /// use u_capacity::scheduler::{ResourceSimulationState, SearchContext};
    /// use u_capacity::timeline::CapacityTimeline;
    ///
    /// let tl = CapacityTimeline::continuous(0, 1_000).unwrap();
    /// let mut state = ResourceSimulationState::new(Resource::single("M1"), tl, EngineConfig::default());
    /// state.initialize(Vec::new()).unwrap();
    ///
    /// let activity = Activity::new("A1", "J1").with_run_time(200);
    /// let left = state.left_neighbor(100);
    /// let window = state
    ///     .find_schedulable_window(&activity, 0, 100, &left, &SearchContext::new(0))
    ///     .unwrap();
    /// assert_eq!(window.success().map(|s| (s.start, s.finish)), Some((100, 300)));
    /// ```
    pub fn find_schedulable_window(
        &self,
        activity: &Activity,
        requirement_index: usize,
        start: Tick,
        left: &SequencingSnapshot,
        ctx: &SearchContext<'_>,
    ) -> CapacityResult<WindowSearch> {
        self.ensure(Lifecycle::Initialized)?;
        let requirement = activity
            .requirement(requirement_index)
            .ok_or(CapacityError::UnknownRequirement(requirement_index))?;

        let material_at = self.material_start(activity, start, ctx.materials);
        let at = material_at.unwrap_or(start);
        let required = self.compute_required_capacity(activity, left, at, ctx.clock)?;

        if self.locked_elsewhere(activity) {
            return Ok(WindowSearch::failed(at, required, ReasonCode::LockedToResUnavail));
        }
        if material_at.is_none() {
            return Ok(WindowSearch::failed(at, required, ReasonCode::MaterialUnavailable));
        }

        let req = ChainRequest::for_activity(activity, at, &required)
            .with_rerun_when_late(self.config.rerun_when_late)
            .with_hint(ctx.hint);
        let found = find_chain(&self.timeline, &req)?;
        let result = self.admit(activity, requirement.attention_percent, found, ctx);
        debug!(
            resource = %self.resource.id,
            activity = %activity.id,
            at,
            success = result.is_success(),
            "window search"
        );
        Ok(WindowSearch { at, required, result })
    }

    /// Back-calculates the latest admissible window finishing by `finish`.
    ///
    /// Required capacity is first computed at `finish`; if it differs at
    /// the start found, the search runs once more with the recomputed
    /// capacity. Material availability must be met at the found start.
    pub fn find_window_reverse(
        &self,
        activity: &Activity,
        requirement_index: usize,
        finish: Tick,
        left: &SequencingSnapshot,
        ctx: &SearchContext<'_>,
    ) -> CapacityResult<WindowSearch> {
        self.ensure(Lifecycle::Initialized)?;
        let requirement = activity
            .requirement(requirement_index)
            .ok_or(CapacityError::UnknownRequirement(requirement_index))?;

        let mut required = self.compute_required_capacity(activity, left, finish, ctx.clock)?;
        if self.locked_elsewhere(activity) {
            return Ok(WindowSearch::failed(finish, required, ReasonCode::LockedToResUnavail));
        }

        let mut result = self.reverse_chain(activity, finish, &required, ctx)?;
        if let Some(start) = result.success().map(|s| s.start) {
            let again = self.compute_required_capacity(activity, left, start, ctx.clock)?;
            if again != required {
                debug!(activity = %activity.id, start, "required capacity changed at back-calculated start");
                required = again;
                result = self.reverse_chain(activity, finish, &required, ctx)?;
            }
        }

        let result = match result {
            SearchResult::Success(s)
                if self.material_start(activity, s.start, ctx.materials) != Some(s.start) =>
            {
                SearchResult::Failure(SearchFailure::new(ReasonCode::MaterialUnavailable, None))
            }
            other => self.admit(activity, requirement.attention_percent, other, ctx),
        };
        Ok(WindowSearch {
            at: finish,
            required,
            result,
        })
    }

    /// Commits a found window as a block.
    ///
    /// On the first block of a pass, a retry event is raised for every
    /// time-based cleanout trigger so the simulation revisits the resource
    /// when it comes due.
    ///
    /// # Errors
    /// - [`CapacityError::Lifecycle`] outside a simulation pass
    /// - [`CapacityError::UnknownRequirement`] for a bad requirement index
    /// - [`CapacityError::OverlappingOccupancy`] if the window overlaps a
    ///   block on a single-tasking resource
    pub fn schedule(
        &mut self,
        activity: &Activity,
        requirement_index: usize,
        required: &RequiredCapacity,
        window: &SearchSuccess,
        events: &mut dyn EventSink,
    ) -> CapacityResult<&Block> {
        self.ensure(Lifecycle::Initialized)?;
        let requirement = activity
            .requirement(requirement_index)
            .ok_or(CapacityError::UnknownRequirement(requirement_index))?;
        let exclusive = self.resource.capacity_type.is_exclusive();

        let timeline = if exclusive {
            let mut spans = self.blocks.spans();
            match window.profile.spans() {
                own if own.is_empty() => spans.push((window.start, window.finish)),
                own => spans.extend(own),
            }
            Some(rebuild(&self.base, &spans)?)
        } else {
            None
        };

        let previous = self.blocks.preceding(window.start);
        let cleared =
            previous.is_some_and(|p| self.timeline.clears_changeovers_between(p.end, window.start));
        let mut clean_before = required.clean_before_span();
        let same_batch = activity.batch_id.is_some()
            && previous.is_some_and(|p| p.in_batch(activity.batch_id.as_deref()));
        if same_batch && clean_before.is_some() {
            if let Some(prev) = self.blocks.preceding_mut(window.start) {
                prev.clean_after = CleanSpan::merge_opt(prev.clean_after, clean_before.take());
                debug!(block = prev.id.0, "clean-before merged into previous batch block");
            }
        }

        let clean_after = required.clean_after_span();
        let block = Block {
            id: self.allocate_block_id(),
            activity: activity.sequenced(),
            requirement_index,
            start: window.start,
            end: window.finish,
            profile: window.profile.clone(),
            required: required.clone(),
            attention_percent: requirement.attention_percent,
            clean_before,
            clean_after,
            quantity: required.quantity,
        };

        self.reservations.release_activity(&activity.id);
        if self
            .reservations
            .move_reservation()
            .is_some_and(|h| h.activity_id == activity.id)
        {
            self.reservations.clear_move_reservation();
        }

        if self.blocks.appends(block.start) {
            self.sequencing.record(&block, exclusive, cleared);
        } else {
            self.sequencing.count_scheduled(exclusive, cleared);
        }
        if !self.time_triggers_seeded {
            self.seed_time_triggers(block.production_start(), events);
        }
        if let Some(tl) = timeline {
            self.timeline = tl;
        }

        info!(
            resource = %self.resource.id,
            activity = %activity.id,
            block = block.id.0,
            start = block.start,
            end = block.end,
            "block scheduled"
        );
        Ok(self.blocks.insert(block))
    }

    /// Removes a committed block.
    ///
    /// # Errors
    /// - [`CapacityError::Lifecycle`] outside a simulation pass
    /// - [`CapacityError::UnknownBlock`] if no such block exists
    pub fn unschedule(&mut self, id: BlockId) -> CapacityResult<Block> {
        self.ensure(Lifecycle::Initialized)?;
        if self.blocks.get(id).is_none() {
            warn!(resource = %self.resource.id, block = id.0, "unschedule of unknown block");
            return Err(CapacityError::UnknownBlock(id));
        }
        let exclusive = self.resource.capacity_type.is_exclusive();
        let timeline = if exclusive {
            let spans: Vec<(Tick, Tick)> = self
                .blocks
                .iter()
                .filter(|b| b.id != id)
                .flat_map(Block::occupied_spans)
                .collect();
            Some(rebuild(&self.base, &spans)?)
        } else {
            None
        };

        let block = self.blocks.remove(id).ok_or(CapacityError::UnknownBlock(id))?;
        let last = self
            .blocks
            .last()
            .map_or_else(SequencingSnapshot::uninitialized, SequencingSnapshot::of_block);
        self.sequencing.rewind(last, exclusive);
        if let Some(tl) = timeline {
            self.timeline = tl;
        }
        info!(resource = %self.resource.id, block = id.0, activity = %block.activity.activity_id, "block unscheduled");
        Ok(block)
    }

    fn locked_elsewhere(&self, activity: &Activity) -> bool {
        activity
            .locked_resource
            .as_deref()
            .is_some_and(|r| r != self.resource.id)
    }

    /// Latest material availability at or after `start`; `None` if a material never arrives.
    fn material_start(
        &self,
        activity: &Activity,
        start: Tick,
        materials: &dyn MaterialAllocator,
    ) -> Option<Tick> {
        let quantity = activity.required_quantity();
        activity.materials.iter().try_fold(start, |at, m| {
            materials
                .earliest_available(activity, m, m.quantity_per_unit * quantity, start)
                .map(|t| at.max(t))
        })
    }

    fn reverse_chain(
        &self,
        activity: &Activity,
        finish: Tick,
        required: &RequiredCapacity,
        ctx: &SearchContext<'_>,
    ) -> CapacityResult<SearchResult> {
        let req = ChainRequest::for_activity(activity, finish, required).with_hint(ctx.hint);
        find_chain_reverse(&self.timeline, ctx.clock, &req)
    }

    /// Applies the capacity-type admission check and the customization veto.
    fn admit(
        &self,
        activity: &Activity,
        percent: u32,
        result: SearchResult,
        ctx: &SearchContext<'_>,
    ) -> SearchResult {
        let s = match result {
            SearchResult::Success(s) => s,
            failure => return failure,
        };
        let rejection = match self.resource.capacity_type {
            CapacityType::Infinite => None,
            CapacityType::SingleTasking => self
                .reservations
                .intersects(&activity.id, s.start, s.finish)
                .map(|c| (c.kind.reason(), Some(c.end))),
            CapacityType::MultiTasking => self.attention_check(&activity.id, percent, &s, ctx.earmarked),
        }
        .or_else(|| match ctx.customization.review(activity, &self.resource, &s) {
            Verdict::Accept => None,
            Verdict::Reject { retry } => Some((ReasonCode::Customization, retry)),
        });

        match rejection {
            None => SearchResult::Success(s),
            Some((reason, retry)) => {
                debug!(activity = %activity.id, ?reason, ?retry, "window rejected");
                SearchResult::Failure(SearchFailure {
                    reason,
                    retry,
                    partial: s.profile,
                    cursor: s.cursor,
                    skipped_late_only: s.skipped_late_only,
                })
            }
        }
    }

    fn attention_check(
        &self,
        activity_id: &str,
        percent: u32,
        s: &SearchSuccess,
        earmarked: &[Hold],
    ) -> Option<(ReasonCode, Option<Tick>)> {
        let limit = self.config.attention_limit;
        let own: Vec<AttentionLoad> = earmarked
            .iter()
            .filter(|h| h.activity_id == activity_id && h.overlaps(s.start, s.finish))
            .map(|h| AttentionLoad::new(h.start, h.end, h.attention_percent))
            .collect();
        if !own.is_empty() && first_shortfall(&own, s.start, s.finish, percent, limit).is_some() {
            return Some((ReasonCode::AttentionConflictBetweenMultipleRRs, None));
        }

        let mut loads = own;
        loads.extend(
            self.blocks
                .overlapping(s.start, s.finish)
                .map(|b| AttentionLoad::new(b.start, b.end, b.attention_percent)),
        );
        loads.extend(self.reservations.attention_loads(activity_id, s.start, s.finish));
        if let Some(short) = first_shortfall(&loads, s.start, s.finish, percent, limit) {
            return Some((ReasonCode::AttentionNotAvailable, short.retry));
        }

        self.reservations
            .move_reservation()
            .filter(|h| h.activity_id != activity_id && h.overlaps(s.start, s.finish))
            .map(|h| (ReasonCode::IntersectsReservedMoveDate, Some(h.end)))
    }

    fn seed_time_triggers(&mut self, production_start: Tick, events: &mut dyn EventSink) {
        self.time_triggers_seeded = true;
        if !self.resource.cleanout.use_time_triggers {
            return;
        }
        for t in self.resource.triggers.time.iter().filter(|t| t.interval > 0) {
            events.retry_at(RetryEvent {
                resource_id: self.resource.id.clone(),
                at: production_start + t.interval,
                cause: RetryCause::TimeCleanoutTrigger,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::models::{
        CleanSource, IntervalType, MaterialRequirement, Resource, ResourceRequirement, StandardTimes,
        TriggerTables,
    };
    use crate::timeline::CapacityTimeline;

    fn state(resource: Resource) -> ResourceSimulationState {
        let mut s = ResourceSimulationState::new(
            resource,
            CapacityTimeline::continuous(0, 1_000).unwrap(),
            EngineConfig::default(),
        );
        s.initialize(Vec::new()).unwrap();
        s
    }

    fn search(s: &ResourceSimulationState, activity: &Activity, at: Tick) -> WindowSearch {
        let left = s.left_neighbor(at);
        s.find_schedulable_window(activity, 0, at, &left, &SearchContext::new(0))
            .unwrap()
    }

    fn commit(s: &mut ResourceSimulationState, activity: &Activity, at: Tick) -> BlockId {
        let w = search(s, activity, at);
        let success = w.success().cloned().unwrap();
        let mut events = Vec::new();
        s.schedule(activity, 0, &w.required, &success, &mut events).unwrap().id
    }

    fn attention(id: &str, percent: u32, run: Tick) -> Activity {
        Activity::new(id, "J")
            .with_run_time(run)
            .with_requirements(vec![ResourceRequirement::new().with_attention(percent)])
    }

    struct LateSteel;

    impl MaterialAllocator for LateSteel {
        fn earliest_available(&self, _: &Activity, m: &MaterialRequirement, _: f64, at: Tick) -> Option<Tick> {
            (m.item_id == "steel").then_some(at.max(250))
        }
    }

    struct RejectBefore(Tick);

    impl ScheduleCustomization for RejectBefore {
        fn review(&self, _: &Activity, _: &Resource, window: &SearchSuccess) -> Verdict {
            if window.start < self.0 {
                Verdict::Reject { retry: Some(self.0) }
            } else {
                Verdict::Accept
            }
        }
    }

    #[test]
    fn test_single_tasking_blocks_occupy_time() {
        let mut s = state(Resource::single("M1"));
        let a1 = Activity::new("A1", "J").with_run_time(100);
        let a2 = Activity::new("A2", "J").with_run_time(100);
        commit(&mut s, &a1, 0);

        let w = search(&s, &a2, 0);
        let f = w.failure().unwrap();
        assert_eq!((f.reason, f.retry), (ReasonCode::HitCleanoutInterval, Some(100)));

        let w = search(&s, &a2, 100);
        assert_eq!(w.success().map(|x| (x.start, x.finish)), Some((100, 200)));
        commit(&mut s, &a2, 100);
        assert_eq!(s.blocks().len(), 2);
        assert_eq!(s.sequencing().since_codes_cleared(), 2);
        assert_eq!(s.timeline().intervals()[1].interval_type, IntervalType::Occupied);
    }

    #[test]
    fn test_paused_window_commits_around_existing_block() {
        let mut s = state(Resource::single("M1"));
        let b1 = commit(&mut s, &Activity::new("A1", "J").with_run_time(100), 100);

        let a2 = Activity::new("A2", "J").with_run_time(150);
        let w = search(&s, &a2, 0);
        let spans: Vec<_> = w
            .success()
            .map(|x| x.profile.spans())
            .unwrap_or_default();
        assert_eq!(spans, [(0, 100), (200, 250)]);
        commit(&mut s, &a2, 0);

        let shape: Vec<_> = s
            .timeline()
            .intervals()
            .iter()
            .map(|iv| (iv.start, iv.end, iv.interval_type))
            .collect();
        assert_eq!(
            shape,
            [
                (0, 100, IntervalType::Occupied),
                (100, 200, IntervalType::Occupied),
                (200, 250, IntervalType::Occupied),
                (250, 1_000, IntervalType::Online),
            ]
        );

        // Removing the inner block frees only its own time.
        s.unschedule(b1).unwrap();
        let free: Vec<_> = s
            .timeline()
            .intervals()
            .iter()
            .filter(|iv| iv.interval_type == IntervalType::Online)
            .map(|iv| (iv.start, iv.end))
            .collect();
        assert_eq!(free, [(100, 200), (250, 1_000)]);
    }

    #[test]
    fn test_foreign_reservation_rejects_window() {
        let mut s = state(Resource::single("M1"));
        s.reservations_mut().unwrap().add_block_reservation(Hold::new("B", 0, 150, 300));
        s.reservations_mut().unwrap().add_block_reservation(Hold::new("A", 0, 0, 50));

        let a = Activity::new("A", "J").with_run_time(200);
        let w = search(&s, &a, 0);
        let f = w.failure().unwrap();
        assert_eq!((f.reason, f.retry), (ReasonCode::IntersectsBlockReservation, Some(300)));

        let w = search(&s, &a, 300);
        assert!(w.result.is_success());

        // Committing releases the activity's own holds.
        commit(&mut s, &a, 300);
        assert_eq!(s.reservations().block_count(), 1);
    }

    #[test]
    fn test_multitasking_attention() {
        let mut s = state(Resource::multi("M1"));
        commit(&mut s, &attention("A1", 60, 100), 0);

        let w = search(&s, &attention("A2", 50, 100), 0);
        let f = w.failure().unwrap();
        assert_eq!((f.reason, f.retry), (ReasonCode::AttentionNotAvailable, Some(100)));

        let w = search(&s, &attention("A3", 40, 100), 0);
        assert_eq!(w.success().map(|x| x.start), Some(0));
    }

    #[test]
    fn test_same_activity_requirements_conflict() {
        let s = state(Resource::multi("M1"));
        let a = attention("A1", 40, 100);
        let earmarked = [Hold::new("A1", 1, 0, 500).with_attention(70)];
        let ctx = SearchContext::new(0).with_earmarked(&earmarked);
        let left = s.left_neighbor(0);
        let w = s.find_schedulable_window(&a, 0, 0, &left, &ctx).unwrap();
        assert_eq!(
            w.failure().map(|f| f.reason),
            Some(ReasonCode::AttentionConflictBetweenMultipleRRs)
        );
    }

    #[test]
    fn test_move_reservation_on_multitasking() {
        let mut s = state(Resource::multi("M1"));
        s.reservations_mut().unwrap().set_move_reservation(Hold::new("X", 0, 50, 80).with_attention(10));
        let w = search(&s, &attention("A1", 10, 100), 0);
        let f = w.failure().unwrap();
        assert_eq!((f.reason, f.retry), (ReasonCode::IntersectsReservedMoveDate, Some(80)));
    }

    #[test]
    fn test_infinite_resource_overlaps() {
        let mut s = state(Resource::infinite("M1"));
        s.reservations_mut().unwrap().add_block_reservation(Hold::new("B", 0, 0, 1_000));
        let a1 = Activity::new("A1", "J").with_run_time(100);
        let a2 = Activity::new("A2", "J").with_run_time(100);
        commit(&mut s, &a1, 0);
        commit(&mut s, &a2, 0);
        assert!(s.blocks().iter().all(|b| b.start == 0));
        assert_eq!(s.timeline().len(), 1);
    }

    #[test]
    fn test_locked_and_material_failures() {
        let s = state(Resource::single("M1"));
        let locked = Activity::new("A1", "J").with_run_time(10).locked_to("M2");
        assert_eq!(
            search(&s, &locked, 0).failure().map(|f| f.reason),
            Some(ReasonCode::LockedToResUnavail)
        );
        let here = Activity::new("A1", "J").with_run_time(10).locked_to("M1");
        assert!(search(&s, &here, 0).result.is_success());

        let steel = Activity::new("A2", "J")
            .with_run_time(10)
            .with_material(MaterialRequirement::new("steel", 2.0));
        let ctx = SearchContext::new(0).with_materials(&LateSteel);
        let left = s.left_neighbor(0);
        let w = s.find_schedulable_window(&steel, 0, 0, &left, &ctx).unwrap();
        assert_eq!(w.at, 250);
        assert_eq!(w.success().map(|x| x.start), Some(250));

        let copper = Activity::new("A3", "J")
            .with_run_time(10)
            .with_material(MaterialRequirement::new("copper", 1.0));
        let w = s.find_schedulable_window(&copper, 0, 0, &left, &ctx).unwrap();
        assert_eq!(w.failure().map(|f| f.reason), Some(ReasonCode::MaterialUnavailable));
    }

    #[test]
    fn test_customization_veto() {
        let s = state(Resource::single("M1"));
        let a = Activity::new("A1", "J").with_run_time(10);
        let veto = RejectBefore(400);
        let ctx = SearchContext::new(0).with_customization(&veto);
        let left = s.left_neighbor(0);
        let w = s.find_schedulable_window(&a, 0, 0, &left, &ctx).unwrap();
        let f = w.failure().unwrap();
        assert_eq!((f.reason, f.retry), (ReasonCode::Customization, Some(400)));
        assert!(s.find_schedulable_window(&a, 0, 400, &left, &ctx).unwrap().result.is_success());
    }

    #[test]
    fn test_unknown_requirement() {
        let s = state(Resource::single("M1"));
        let a = Activity::new("A1", "J").with_run_time(10);
        let left = s.left_neighbor(0);
        assert_eq!(
            s.find_schedulable_window(&a, 3, 0, &left, &SearchContext::new(0)).unwrap_err(),
            CapacityError::UnknownRequirement(3)
        );
    }

    #[test]
    fn test_time_triggers_seeded_once() {
        let resource = Resource::single("M1").with_triggers(
            TriggerTables::new()
                .with_time(500, CleanSpan::new(30, 1, CleanSource::TimeTrigger))
                .with_time(800, CleanSpan::new(60, 2, CleanSource::TimeTrigger)),
        );
        let mut s = state(resource);
        let a1 = Activity::new("A1", "J").with_run_time(100);
        let w = search(&s, &a1, 10);
        let success = w.success().cloned().unwrap();
        let mut events = Vec::new();
        s.schedule(&a1, 0, &w.required, &success, &mut events).unwrap();
        let ats: Vec<Tick> = events.iter().map(|e| e.at).collect();
        assert_eq!(ats, [510, 810]);
        assert!(events.iter().all(|e| e.cause == RetryCause::TimeCleanoutTrigger));

        let a2 = Activity::new("A2", "J").with_run_time(100);
        let w = search(&s, &a2, 110);
        let success = w.success().cloned().unwrap();
        s.schedule(&a2, 0, &w.required, &success, &mut events).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_batch_clean_merges_into_previous_block() {
        let resource = Resource::single("M1").with_standard_clean(CleanSpan::new(20, 1, CleanSource::Resource));
        let mut s = state(resource);
        let a1 = Activity::new("A1", "J").with_batch("B1").with_run_time(100);
        let a2 = Activity::new("A2", "J").with_batch("B1").with_run_time(100);
        let first = commit(&mut s, &a1, 0);

        let w = search(&s, &a2, 100);
        assert_eq!(w.required.clean_before.ticks, 20);
        assert_eq!(w.success().map(|x| x.finish), Some(220));
        let success = w.success().cloned().unwrap();
        let second = s.schedule(&a2, 0, &w.required, &success, &mut Vec::new()).unwrap().id;

        assert_eq!(s.block(first).and_then(|b| b.clean_after).map(|c| c.ticks), Some(20));
        assert!(s.block(second).and_then(|b| b.clean_before).is_none());
    }

    #[test]
    fn test_graded_clean_after_covers_next_clean_before() {
        let resource = Resource::single("M1").with_standard_clean(CleanSpan::new(20, 1, CleanSource::Resource));
        let mut s = state(resource);
        let a1 = Activity::new("A1", "J")
            .with_times(StandardTimes::run(100).with_clean_after(10).with_clean_after_grade(2));
        let first = commit(&mut s, &a1, 0);
        let end = s.block(first).map(|b| b.end).unwrap();
        assert_eq!(
            s.block(first).and_then(|b| b.clean_after).map(|c| (c.ticks, c.grade)),
            Some((10, 2))
        );

        let w = search(&s, &Activity::new("A2", "J").with_run_time(100), end);
        assert_eq!(w.required.clean_before.ticks, 0);
    }

    #[test]
    fn test_unschedule_restores_timeline() {
        let mut s = state(Resource::single("M1"));
        let a1 = Activity::new("A1", "J").with_run_time(100);
        let a2 = Activity::new("A2", "J").with_run_time(100);
        commit(&mut s, &a1, 0);
        let b2 = commit(&mut s, &a2, 100);

        let removed = s.unschedule(b2).unwrap();
        assert_eq!(removed.activity.activity_id, "A2");
        assert_eq!(s.sequencing().last().end, 100);
        assert_eq!(s.sequencing().since_codes_cleared(), 1);
        assert_eq!(s.timeline().len(), 2);
        assert_eq!(s.last_scheduled().map(|b| b.end), Some(100));
        assert_eq!(s.unschedule(b2).unwrap_err(), CapacityError::UnknownBlock(b2));

        s.finalize().unwrap();
        assert!(matches!(s.unschedule(BlockId(1)), Err(CapacityError::Lifecycle { .. })));
    }

    #[test]
    fn test_reverse_window() {
        let mut s = state(Resource::single("M1"));
        let a = Activity::new("A1", "J").with_run_time(100);
        let left = s.left_neighbor(0);
        let w = s
            .find_window_reverse(&a, 0, 500, &left, &SearchContext::new(0))
            .unwrap();
        assert_eq!(w.success().map(|x| (x.start, x.finish)), Some((400, 500)));

        commit(&mut s, &Activity::new("B", "J").with_run_time(100), 450);
        let w = s
            .find_window_reverse(&a, 0, 500, &left, &SearchContext::new(0))
            .unwrap();
        assert_eq!(w.success().map(|x| x.finish), Some(450));
    }
}
