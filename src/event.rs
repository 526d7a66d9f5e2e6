
use std::cell::{Cell,RefCell};
use std::convert::TryInto;
use std::rc::{Rc,Weak};

/// An amount of cycles.
pub type Time = u64;

///A trait to be implemented for generic objects to be inserted in the event queue.
pub trait Eventful
{
	///Method to be called to process the events. Do all things that must be done in the current cycle, if any.
	fn process(&mut self);
	///Extract the eventful from the implementing class. Required since `as Rc<RefCell<Eventful>>` does not work.
	fn as_eventful(&self) -> Weak<RefCell<dyn Eventful>>;
	///Schedule this component to be executed after `delay` cycles.
	///Call with 0 to schedule in the current cycle, after the events already queued for it.
	fn schedule(&self, scheduler:&dyn Scheduler, delay:Time)
	{
		let component = self.as_eventful().upgrade().expect("missing component");
		scheduler.schedule_relative(component,delay);
	}
}

/**
The handle given to components to ask for future invocations. There is a single global time that only advances.
Components scheduled for the same cycle are processed in the order they were scheduled.
A component already waiting for a cycle is not scheduled twice for that cycle.
**/
pub trait Scheduler
{
	///The cycle currently being processed.
	fn now(&self) -> Time;
	///Process `component` at cycle `now()+delay`.
	fn schedule_relative(&self, component:Rc<RefCell<dyn Eventful>>, delay:Time);
	///Process `component` at cycle `time`, which cannot be in the past.
	fn schedule_absolute(&self, component:Rc<RefCell<dyn Eventful>>, time:Time);
}

///The events stored in the event queue.
#[derive(Clone)]
pub struct Event
{
	component: Rc<RefCell<dyn Eventful>>,
}

impl Event
{
	///Whether both events would invoke the same component.
	fn same_component(&self, other:&Rc<RefCell<dyn Eventful>>) -> bool
	{
		Rc::as_ptr(&self.component) as *const () == Rc::as_ptr(other) as *const ()
	}
}

///The event queue structure managing the insertion and extraction of events.
///Implemented over interior mutability, so that it can be shared as a `Rc<dyn Scheduler>` by every component while it processes them.
pub struct EventQueue
{
	///The events of each of the next cycles. The list at `current` is the one being processed.
	event_circle: RefCell<Vec<Vec<Event>>>,
	///offset currently being accessed.
	current: Cell<usize>,
	///Number of events of the current cycle already processed.
	processed: Cell<usize>,
	cycle: Cell<Time>,
}

impl EventQueue
{
	///Creates a new EventQueue. `size` should be greater than any possible delay.
	pub fn new(size:usize) -> EventQueue
	{
		assert!(size>=2,"The event queue must hold at least the current and the next cycle.");
		EventQueue{
			event_circle: RefCell::new(vec![ vec![] ; size ]),
			current: Cell::new(0),
			processed: Cell::new(0),
			cycle: Cell::new(0),
		}
	}
	///Adds an event to the list of events to be executed at the cycle `current_cycle + delay`.
	fn enqueue(&self, component:Rc<RefCell<dyn Eventful>>, delay:Time)
	{
		let mut circle = self.event_circle.borrow_mut();
		let delay : usize = delay.try_into().expect("delay does not fit in memory");
		if delay>=circle.len()
		{
			panic!("Delay too long: {} cycles while the event queue holds {}.",delay,circle.len());
		}
		let position=(self.current.get()+delay) % circle.len();
		let first_pending = if delay==0 { self.processed.get() } else { 0 };
		let list = &mut circle[position];
		if list[first_pending..].iter().any(|event|event.same_component(&component))
		{
			return;
		}
		list.push(Event{component});
	}
	///Access to a clone of the event in the `ievent` index of the current cycle.
	fn access(&self, ievent:usize) -> Option<Event>
	{
		self.event_circle.borrow()[self.current.get()].get(ievent).cloned()
	}
	///Process every event of the current cycle, including those added to it meanwhile, and advance to the next cycle.
	///Returns the number of processed events.
	pub fn process_cycle(&self) -> usize
	{
		let mut ievent = 0;
		while let Some(event) = self.access(ievent)
		{
			ievent += 1;
			self.processed.set(ievent);
			event.component.borrow_mut().process();
		}
		self.advance();
		ievent
	}
	///Advances the queue by a cycle. This drops the events in the finished cycle.
	fn advance(&self)
	{
		let mut circle = self.event_circle.borrow_mut();
		//Better to drop the old Vec; otherwise their capacity is covering a lot of memory.
		circle[self.current.get()] = Vec::new();
		self.current.set( (self.current.get()+1) % circle.len() );
		self.processed.set(0);
		self.cycle.set(self.cycle.get()+1);
	}
	///Process cycles until reaching `cycle`, which is not processed.
	pub fn run_until(&self, cycle:Time)
	{
		while self.cycle.get() < cycle
		{
			self.process_cycle();
		}
	}
	///Whether there is no event waiting in any cycle.
	pub fn is_empty(&self) -> bool
	{
		let circle = self.event_circle.borrow();
		circle.iter().enumerate().all(|(index,list)|
			if index==self.current.get() { list.len()<=self.processed.get() } else { list.is_empty() }
		)
	}
}

impl Scheduler for EventQueue
{
	fn now(&self) -> Time
	{
		self.cycle.get()
	}
	fn schedule_relative(&self, component:Rc<RefCell<dyn Eventful>>, delay:Time)
	{
		self.enqueue(component,delay);
	}
	fn schedule_absolute(&self, component:Rc<RefCell<dyn Eventful>>, time:Time)
	{
		let now = self.cycle.get();
		if time < now
		{
			panic!("Trying to schedule an event at cycle {} while at cycle {}.",time,now);
		}
		self.enqueue(component,time-now);
	}
}
